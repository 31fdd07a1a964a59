//! # List View
//!
//! One table of records: a cache of its own, typed rows decoded from it, a delete dialog,
//! and patch dialogs such as "mark read". The view never edits its rows; a confirmed
//! action goes through the gateway and the row changes when the refetch lands.

use crate::clients::record_client::encode;
use crate::error::AdminError;
use crate::resource::AdminResource;
use resource_sync::{
    ActionCoordinator, ActionEvent, CacheHandle, CacheState, ConfirmSurface, DeleteRecord,
    DialogState, MutationGateway, PatchRecord, RecordId, ResourceCache, ResourceSpec, SyncClient,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

pub struct ListView<R: AdminResource> {
    cache: ResourceCache,
    deletes: ActionCoordinator<DeleteRecord>,
    gateway: MutationGateway,
    surface: Arc<dyn ConfirmSurface>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: AdminResource> ListView<R> {
    /// Opens a fresh cache for `spec`. Its projection must keep every column `R` needs,
    /// otherwise rows are skipped when decoding.
    pub fn open(sync: &SyncClient, spec: ResourceSpec, surface: Arc<dyn ConfirmSurface>) -> Self {
        let cache = sync.open(spec);
        let deletes = ActionCoordinator::new(
            DeleteRecord::new(R::NAME),
            sync.gateway().clone(),
            surface.clone(),
            cache.handle(),
        );
        Self {
            cache,
            deletes,
            gateway: sync.gateway().clone(),
            surface,
            _resource: PhantomData,
        }
    }

    /// Reports delete outcomes on `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ActionEvent>) -> Self {
        self.deletes = self.deletes.with_events(events);
        self
    }

    /// Current rows, in cache order.
    pub fn rows(&self) -> Vec<R> {
        decode_rows(&self.cache.state())
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    /// Waits until the state satisfies `predicate`, then returns the rows at that point.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&CacheState) -> bool,
    ) -> Result<Vec<R>, AdminError> {
        let state = self.cache.wait_for(predicate).await?;
        Ok(decode_rows(&state))
    }

    pub fn request_delete(&mut self, id: RecordId) -> Result<(), AdminError> {
        Ok(self.deletes.request(id)?)
    }

    pub fn cancel_delete(&mut self) {
        self.deletes.cancel();
    }

    pub async fn confirm_delete(&mut self) -> Result<(), AdminError> {
        Ok(self.deletes.confirm().await?)
    }

    pub fn dialog(&self) -> &DialogState {
        self.deletes.state()
    }

    /// A confirm-then-update dialog that applies `patch` to whichever row it is opened
    /// for. The patch is checked against the resource's update schema on confirm.
    pub fn patch_dialog(
        &self,
        label: &str,
        patch: &R::Update,
    ) -> Result<ActionCoordinator<PatchRecord>, AdminError> {
        let patch = encode::<R, _>(patch)?;
        Ok(ActionCoordinator::new(
            PatchRecord::new(R::NAME, label, patch, R::update_schema()),
            self.gateway.clone(),
            self.surface.clone(),
            self.cache.handle(),
        ))
    }

    pub fn refresh(&self) {
        self.cache.refresh();
    }

    pub fn handle(&self) -> CacheHandle {
        self.cache.handle()
    }

    pub fn close(&mut self) {
        self.deletes.reset();
        self.cache.close();
    }
}

fn decode_rows<R: AdminResource>(state: &CacheState) -> Vec<R> {
    state
        .collection
        .iter()
        .filter_map(|record| match record.decode::<R>() {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(resource = R::NAME, id = %record.id, error = %e, "Row does not decode");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Service;
    use crate::views::LogSurface;
    use resource_sync::{CacheConfig, MemoryStore};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn seed(store: &MemoryStore) {
        store.seed("services", "s1", 1, json!({ "title": "Policy Review", "slug": "policy-review" }));
        store.seed("services", "s2", 2, json!({ "title": "Audit", "slug": "audit" }));
    }

    #[tokio::test]
    async fn test_rows_follow_service_order() {
        let store = Arc::new(MemoryStore::new());
        seed(&store);
        let sync = SyncClient::new(store.clone(), store.clone(), CacheConfig::default());

        let view = ListView::<Service>::open(&sync, Service::spec(), Arc::new(LogSurface::new()));
        let rows = timeout(Duration::from_secs(5), view.wait_for(|s| s.revision >= 1))
            .await
            .unwrap()
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Audit", "Policy Review"]);
    }

    #[tokio::test]
    async fn test_cancelled_delete_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        seed(&store);
        let sync = SyncClient::new(store.clone(), store.clone(), CacheConfig::default());
        let surface = Arc::new(LogSurface::new());

        let mut view = ListView::<Service>::open(&sync, Service::spec(), surface.clone());
        view.request_delete(RecordId::from("s1")).unwrap();
        assert!(surface.is_open());
        assert!(matches!(view.dialog(), DialogState::Confirming { .. }));

        view.cancel_delete();
        assert!(!surface.is_open());
        assert_eq!(view.dialog(), &DialogState::Idle);
        assert_eq!(store.write_count(), 0);
    }
}

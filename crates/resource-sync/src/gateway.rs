//! # Mutation Gateway
//!
//! Single write path for every resource. The gateway never touches a cache: after a
//! write is acknowledged it only posts the resource name to the
//! [`InvalidationBus`], and the caches refetch on their own, exactly as they would for
//! a write made by another session.
//!
//! Writes are routed per resource:
//!
//! | Route | Create | Update | Delete |
//! |-------|--------|--------|--------|
//! | [`WriteRoute::Store`] | store | store | store |
//! | [`WriteRoute::Guarded`] | store | endpoint | endpoint |
//!
//! Validation happens before the gateway is called; payloads reaching it are trusted.

use crate::endpoint::{EndpointError, GuardedEndpoint};
use crate::error::SyncError;
use crate::invalidation::InvalidationBus;
use crate::record::{Payload, Record, RecordId};
use crate::resource::ResourceName;
use crate::store::RemoteStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRoute {
    Store,
    Guarded,
}

#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<dyn RemoteStore>,
    endpoint: Option<Arc<dyn GuardedEndpoint>>,
    guarded: Arc<HashSet<ResourceName>>,
    bus: Option<InvalidationBus>,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            endpoint: None,
            guarded: Arc::new(HashSet::new()),
            bus: None,
        }
    }

    /// Sends updates and deletes of `resources` through `endpoint`.
    pub fn with_guarded_endpoint<I>(mut self, endpoint: Arc<dyn GuardedEndpoint>, resources: I) -> Self
    where
        I: IntoIterator<Item = ResourceName>,
    {
        self.endpoint = Some(endpoint);
        self.guarded = Arc::new(resources.into_iter().collect());
        self
    }

    pub fn with_invalidations(mut self, bus: InvalidationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn route(&self, resource: &ResourceName) -> WriteRoute {
        if self.endpoint.is_some() && self.guarded.contains(resource) {
            WriteRoute::Guarded
        } else {
            WriteRoute::Store
        }
    }

    #[instrument(skip(self, payload), fields(%resource))]
    pub async fn create(&self, resource: &ResourceName, payload: Payload) -> Result<Record, SyncError> {
        let record = self
            .store
            .insert(resource, payload)
            .await
            .map_err(|e| self.rejected(resource, SyncError::from_write(resource, e)))?;
        self.acknowledged(resource, &record.id, "Created");
        Ok(record)
    }

    #[instrument(skip(self, payload), fields(%resource, %id))]
    pub async fn update(
        &self,
        resource: &ResourceName,
        id: &RecordId,
        payload: Payload,
    ) -> Result<Record, SyncError> {
        let result = match (self.route(resource), &self.endpoint) {
            (WriteRoute::Guarded, Some(endpoint)) => endpoint
                .put(resource, id, payload)
                .await
                .map_err(|e| endpoint_error(resource, id, e)),
            _ => self
                .store
                .update(resource, id, payload)
                .await
                .map_err(|e| SyncError::from_write(resource, e)),
        };
        let record = result.map_err(|e| self.rejected(resource, e))?;
        self.acknowledged(resource, id, "Updated");
        Ok(record)
    }

    #[instrument(skip(self), fields(%resource, %id))]
    pub async fn delete(&self, resource: &ResourceName, id: &RecordId) -> Result<(), SyncError> {
        let result = match (self.route(resource), &self.endpoint) {
            (WriteRoute::Guarded, Some(endpoint)) => endpoint
                .delete(resource, id)
                .await
                .map_err(|e| endpoint_error(resource, id, e)),
            _ => self
                .store
                .delete(resource, id)
                .await
                .map_err(|e| SyncError::from_write(resource, e)),
        };
        result.map_err(|e| self.rejected(resource, e))?;
        self.acknowledged(resource, id, "Deleted");
        Ok(())
    }

    fn acknowledged(&self, resource: &ResourceName, id: &RecordId, what: &'static str) {
        info!(%resource, %id, "{what}");
        if let Some(bus) = &self.bus {
            bus.invalidate(resource);
        }
    }

    fn rejected(&self, resource: &ResourceName, error: SyncError) -> SyncError {
        warn!(%resource, %error, "Write failed");
        error
    }
}

fn endpoint_error(
    resource: &ResourceName,
    id: &RecordId,
    err: EndpointError,
) -> SyncError {
    if err.is_not_found() {
        SyncError::NotFound {
            resource: resource.clone(),
            id: id.clone(),
        }
    } else {
        SyncError::Write {
            resource: resource.clone(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[tokio::test]
    async fn test_acknowledged_write_invalidates() {
        let store = Arc::new(MemoryStore::new());
        let bus = InvalidationBus::new(8);
        let mut invalidations = bus.listen();
        let gateway = MutationGateway::new(store.clone()).with_invalidations(bus);

        let record = gateway
            .create(&"contacts".into(), payload(json!({ "email": "a@example.com" })))
            .await
            .unwrap();
        assert_eq!(record.fields["email"], json!("a@example.com"));
        assert_eq!(invalidations.recv().await.unwrap(), ResourceName::from("contacts"));
    }

    #[tokio::test]
    async fn test_failed_write_does_not_invalidate() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_write(StoreError::Rejected("duplicate key".into()));
        let bus = InvalidationBus::new(8);
        let mut invalidations = bus.listen();
        let gateway = MutationGateway::new(store.clone()).with_invalidations(bus);

        let err = gateway
            .create(&"services".into(), Payload::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Write { .. }));
        assert!(invalidations.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let gateway = MutationGateway::new(store);
        let err = gateway
            .delete(&"services".into(), &"ghost".into())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_guarded_resources_use_endpoint() {
        let store = Arc::new(MemoryStore::new());
        store.seed("testimonials", "t1", 1, json!({ "status": "pending" }));
        let gateway = MutationGateway::new(store.clone())
            .with_guarded_endpoint(store.clone(), [ResourceName::from("testimonials")]);

        assert_eq!(gateway.route(&"testimonials".into()), WriteRoute::Guarded);
        assert_eq!(gateway.route(&"services".into()), WriteRoute::Store);

        let updated = gateway
            .update(
                &"testimonials".into(),
                &"t1".into(),
                payload(json!({ "status": "approved" })),
            )
            .await
            .unwrap();
        assert_eq!(updated.fields["status"], json!("approved"));

        let err = gateway
            .delete(&"testimonials".into(), &"t9".into())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
    }
}

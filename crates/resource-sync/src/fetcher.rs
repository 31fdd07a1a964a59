//! # Collection Fetcher
//!
//! Performs one full, ordered read of a resource. There are no delta reads: every fetch
//! returns the entire collection, and the cache replaces what it holds wholesale.

use crate::error::{StoreError, SyncError};
use crate::record::Collection;
use crate::resource::{ResourceSpec, SelectQuery};
use crate::store::RemoteStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct CollectionFetcher {
    store: Arc<dyn RemoteStore>,
    timeout: Option<Duration>,
}

impl CollectionFetcher {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Bounds every read; an expired read fails with [`StoreError::Timeout`].
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch(&self, spec: &ResourceSpec) -> Result<Collection, SyncError> {
        let query = SelectQuery {
            resource: spec.name.clone(),
            projection: spec.projection.clone().with_identity(),
            order: spec.order.clone(),
        };

        let read = self.store.select(&query);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(limit.as_millis() as u64)),
            },
            None => read.await,
        };

        match result {
            Ok(records) => {
                debug!(resource = %spec.name, count = records.len(), "Fetched");
                Ok(Collection::new(records))
            }
            Err(source) => {
                warn!(resource = %spec.name, error = %source, "Fetch failed");
                Err(SyncError::RemoteRead {
                    resource: spec.name.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::resource::{OrderBy, Projection};
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_orders_and_projects() {
        let store = Arc::new(MemoryStore::new());
        store.seed("services", "s1", 1, json!({"title": "Audit", "price": 300}));
        store.seed("services", "s2", 2, json!({"title": "Policy", "price": 100}));

        let fetcher = CollectionFetcher::new(store);
        let spec = ResourceSpec::new("services")
            .order_by(OrderBy::asc("price"))
            .project(Projection::columns(["title"]));

        let collection = fetcher.fetch(&spec).await.unwrap();
        assert_eq!(collection.ids(), vec!["s2".into(), "s1".into()]);
        let first = &collection.records()[0];
        assert_eq!(first.fields.get("title"), Some(&json!("Policy")));
        assert!(first.fields.get("price").is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_remote_read_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_read(StoreError::Unauthorized("expired session".into()));
        let fetcher = CollectionFetcher::new(store);

        let err = fetcher.fetch(&ResourceSpec::new("contacts")).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::RemoteRead { source: StoreError::Unauthorized(_), .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout() {
        let store = Arc::new(MemoryStore::new());
        let _gate = store.hold_reads();
        let fetcher = CollectionFetcher::new(store).with_timeout(Some(Duration::from_millis(50)));

        let err = fetcher.fetch(&ResourceSpec::new("contacts")).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::RemoteRead { source: StoreError::Timeout(50), .. }
        ));
    }
}

//! Session-local invalidation requests.
//!
//! After the [`MutationGateway`](crate::MutationGateway) has a write acknowledged it posts
//! the resource name here. Every cache opened against the same bus treats a matching name
//! as a [`refresh`](crate::ResourceCache::refresh). The bus never carries data, so no
//! cache is mutated by the write path directly.

use crate::resource::ResourceName;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<ResourceName>,
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Asks every listening cache of `resource` to refetch. Returns how many listeners
    /// were reached.
    pub fn invalidate(&self, resource: &ResourceName) -> usize {
        let reached = self.sender.send(resource.clone()).unwrap_or(0);
        debug!(%resource, reached, "Invalidated");
        reached
    }

    pub fn listen(&self) -> broadcast::Receiver<ResourceName> {
        self.sender.subscribe()
    }
}

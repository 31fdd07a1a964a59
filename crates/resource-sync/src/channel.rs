//! # Change Channel
//!
//! Wraps a [`ChangeFeed`] and hands out [`Subscription`] handles. A subscription is owned
//! by exactly one cache instance; it is neither `Clone` nor transferable between caches,
//! and it has only two states, [`SubscriptionState::Active`] and
//! [`SubscriptionState::Closed`].

use crate::error::{StoreError, SyncError};
use crate::resource::ResourceName;
use crate::store::{ChangeFeed, ChangeSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Closed,
}

/// Factory for per-resource subscriptions.
#[derive(Clone)]
pub struct ChangeChannel {
    feed: Arc<dyn ChangeFeed>,
    timeout: Option<Duration>,
}

impl ChangeChannel {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            timeout: None,
        }
    }

    /// Bounds every subscribe call; an expired attempt fails like a refused one.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Opens a subscription to the mutation stream of `resource`.
    pub async fn subscribe(&self, resource: &ResourceName) -> Result<Subscription, SyncError> {
        let subscribing = self.feed.subscribe(resource);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, subscribing).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(limit.as_millis() as u64)),
            },
            None => subscribing.await,
        };
        let receiver = result.map_err(|e| SyncError::Subscription {
            resource: resource.clone(),
            reason: e.to_string(),
        })?;
        info!(%resource, "Subscribed");
        Ok(Subscription {
            resource: resource.clone(),
            receiver: Some(receiver),
        })
    }
}

/// One live connection to a resource's change stream.
#[derive(Debug)]
pub struct Subscription {
    resource: ResourceName,
    receiver: Option<broadcast::Receiver<ChangeSignal>>,
}

impl Subscription {
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    pub fn state(&self) -> SubscriptionState {
        if self.receiver.is_some() {
            SubscriptionState::Active
        } else {
            SubscriptionState::Closed
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Active
    }

    /// Waits for the next signal.
    ///
    /// Returns `None` once the subscription is closed or the feed went away; the handle is
    /// then [`SubscriptionState::Closed`]. A receiver that fell behind yields a single
    /// signal for everything it missed.
    pub async fn recv(&mut self) -> Option<ChangeSignal> {
        let receiver = self.receiver.as_mut()?;
        match receiver.recv().await {
            Ok(signal) => Some(signal),
            Err(RecvError::Lagged(missed)) => {
                debug!(resource = %self.resource, missed, "Lagged");
                Some(ChangeSignal)
            }
            Err(RecvError::Closed) => {
                debug!(resource = %self.resource, "Feed ended");
                self.receiver = None;
                None
            }
        }
    }

    /// Discards signals that are already queued and returns how many there were.
    pub fn drain(&mut self) -> usize {
        let Some(receiver) = self.receiver.as_mut() else {
            return 0;
        };
        let mut drained = 0;
        loop {
            match receiver.try_recv() {
                Ok(_) => drained += 1,
                Err(TryRecvError::Lagged(missed)) => drained += missed as usize,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    self.receiver = None;
                    break;
                }
            }
        }
        drained
    }

    /// Releases the subscription. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.receiver.take().is_some() {
            debug!(resource = %self.resource, "Subscription closed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_subscription_receives_and_closes() {
        let store = Arc::new(MemoryStore::new());
        let channel = ChangeChannel::new(store.clone());
        let resource = ResourceName::from("contacts");

        let mut sub = channel.subscribe(&resource).await.unwrap();
        assert!(sub.is_active());

        store.notify(&resource);
        store.notify(&resource);
        assert_eq!(sub.recv().await, Some(ChangeSignal));
        assert_eq!(sub.drain(), 1);

        sub.close();
        sub.close();
        assert_eq!(sub.state(), SubscriptionState::Closed);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_subscription_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_subscribe(StoreError::Transport("socket refused".into()));
        let channel = ChangeChannel::new(store);

        let err = channel
            .subscribe(&ResourceName::from("services"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Subscription { .. }));
    }

    struct SilentFeed;

    #[async_trait::async_trait]
    impl ChangeFeed for SilentFeed {
        async fn subscribe(
            &self,
            _resource: &ResourceName,
        ) -> Result<broadcast::Receiver<ChangeSignal>, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_that_never_answers_times_out() {
        let channel =
            ChangeChannel::new(Arc::new(SilentFeed)).with_timeout(Some(Duration::from_millis(200)));

        let err = channel
            .subscribe(&ResourceName::from("contacts"))
            .await
            .unwrap_err();
        match err {
            SyncError::Subscription { reason, .. } => assert!(reason.contains("200")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

//! # Resource Cache
//!
//! A [`ResourceCache`] is the client side of one cache instance: one per (view,
//! resource) pair, owned by the view that displays it. It holds the latest
//! [`CacheState`] in a `watch` channel and drives a background actor for as long as it
//! is open.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──open()──▶ Open ──close()──▶ Closed ──open()──▶ Open (new epoch)
//!                    │
//!                    └─ drop ─▶ Closed
//! ```
//!
//! Every `open` starts a new epoch. `close` bumps the epoch before anything else, so a
//! fetch that resolves later can never reach the state again. After `close` the state is
//! [`CacheState::default`] and stays that way until the next `open`.
//!
//! A [`CacheHandle`] can refresh or close the cache without borrowing it; the
//! coordinator and the console's shutdown path use one.
//!
//! ## Usage
//!
//! ```rust
//! use resource_sync::{ChangeChannel, CollectionFetcher, MemoryStore, ResourceCache, ResourceSpec};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     store.seed("services", "s1", 1, json!({ "title": "Audit" }));
//!
//!     let mut cache = ResourceCache::new(
//!         ResourceSpec::new("services"),
//!         CollectionFetcher::new(store.clone()),
//!         ChangeChannel::new(store.clone()),
//!     );
//!     cache.open();
//!
//!     let state = cache.wait_for(|s| s.revision >= 1).await.unwrap();
//!     assert_eq!(state.collection.len(), 1);
//!     cache.close();
//! }
//! ```

use crate::actor::{ActorParts, CacheActor};
use crate::channel::ChangeChannel;
use crate::config::ReconnectConfig;
use crate::error::SyncError;
use crate::fetcher::CollectionFetcher;
use crate::invalidation::InvalidationBus;
use crate::message::CacheCommand;
use crate::record::Collection;
use crate::resource::{ResourceName, ResourceSpec};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Snapshot of one cache instance as seen by its view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    /// Result of the last successful fetch, in server order.
    pub collection: Collection,
    /// A fetch is in flight or queued.
    pub loading: bool,
    /// Error of the most recent fetch, cleared by the next successful one.
    pub error: Option<SyncError>,
    /// A change subscription is currently established.
    pub live: bool,
    /// Number of successful fetches applied since the last `open`.
    pub revision: u64,
}

/// What belongs to the current open lifetime of one cache.
struct Lifetime {
    commands: mpsc::UnboundedSender<CacheCommand>,
    task: JoinHandle<()>,
}

/// State shared between a cache, its handles and its actor.
pub(crate) struct Shared {
    resource: ResourceName,
    epoch: AtomicU64,
    state: watch::Sender<CacheState>,
    lifetime: Mutex<Option<Lifetime>>,
}

impl Shared {
    fn lifetime(&self) -> MutexGuard<'_, Option<Lifetime>> {
        self.lifetime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `modify` unless `epoch` is no longer current. The check runs under the
    /// `watch` sender's lock, so it cannot interleave with a close.
    pub(crate) fn publish(&self, epoch: u64, modify: impl FnOnce(&mut CacheState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            modify(state);
            true
        })
    }

    fn is_open(&self) -> bool {
        self.lifetime().is_some()
    }

    fn refresh(&self) -> bool {
        match self.lifetime().as_ref() {
            Some(lifetime) => lifetime.commands.send(CacheCommand::Refresh).is_ok(),
            None => {
                debug!(resource = %self.resource, "Refresh ignored, cache closed");
                false
            }
        }
    }

    /// Ends the current lifetime and returns its task, if there was one.
    fn close(&self) -> Option<JoinHandle<()>> {
        let lifetime = self.lifetime().take()?;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(CacheState::default());
        let _ = lifetime.commands.send(CacheCommand::Close);
        info!(resource = %self.resource, epoch, "Cache closed");
        Some(lifetime.task)
    }
}

/// Live, ordered view of one remote resource.
pub struct ResourceCache {
    spec: ResourceSpec,
    fetcher: CollectionFetcher,
    channel: ChangeChannel,
    reconnect: ReconnectConfig,
    bus: Option<InvalidationBus>,
    shared: Arc<Shared>,
    state_rx: watch::Receiver<CacheState>,
}

impl ResourceCache {
    /// Creates a closed cache. Nothing is fetched until [`open`](Self::open).
    pub fn new(spec: ResourceSpec, fetcher: CollectionFetcher, channel: ChangeChannel) -> Self {
        let (state, state_rx) = watch::channel(CacheState::default());
        let shared = Arc::new(Shared {
            resource: spec.name.clone(),
            epoch: AtomicU64::new(0),
            state,
            lifetime: Mutex::new(None),
        });
        Self {
            spec,
            fetcher,
            channel,
            reconnect: ReconnectConfig::default(),
            bus: None,
            shared,
            state_rx,
        }
    }

    /// Refetches whenever `bus` carries this cache's resource name.
    pub fn with_invalidations(mut self, bus: InvalidationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn resource(&self) -> &ResourceName {
        &self.spec.name
    }

    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Opens the cache: subscribes, then issues the initial fetch.
    ///
    /// Opening an open cache closes it first. Must be called within a Tokio runtime.
    pub fn open(&mut self) {
        self.close();

        let mut lifetime = self.shared.lifetime();
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.state.send_replace(CacheState {
            loading: true,
            ..CacheState::default()
        });

        let (commands, receiver) = mpsc::unbounded_channel();
        let actor = CacheActor::new(
            ActorParts {
                spec: self.spec.clone(),
                fetcher: self.fetcher.clone(),
                channel: self.channel.clone(),
                reconnect: self.reconnect.clone(),
                invalidations: self.bus.as_ref().map(InvalidationBus::listen),
                shared: self.shared.clone(),
                epoch,
            },
            receiver,
        );
        let task = tokio::spawn(actor.run());
        *lifetime = Some(Lifetime { commands, task });
        debug!(resource = %self.spec.name, epoch, "Open requested");
    }

    /// Closes the cache. Idempotent.
    ///
    /// The state resets to [`CacheState::default`] immediately; the subscription is
    /// released by the actor as soon as it sees the request.
    pub fn close(&mut self) {
        self.shared.close();
    }

    /// Asks for a refetch. Coalesces with a fetch already in flight; no-op when closed.
    pub fn refresh(&self) {
        self.shared.refresh();
    }

    /// A cloneable handle that follows this cache across close and reopen.
    pub fn handle(&self) -> CacheHandle {
        CacheHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn state(&self) -> CacheState {
        self.state_rx.borrow().clone()
    }

    pub fn collection(&self) -> Collection {
        self.state_rx.borrow().collection.clone()
    }

    /// Receiver that observes every published state.
    pub fn watch(&self) -> watch::Receiver<CacheState> {
        self.state_rx.clone()
    }

    /// Waits until the state satisfies `predicate` and returns that state.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&CacheState) -> bool,
    ) -> Result<CacheState, SyncError> {
        let mut receiver = self.state_rx.clone();
        let state = receiver
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| SyncError::CacheClosed)?;
        Ok(state.clone())
    }
}

impl Drop for ResourceCache {
    fn drop(&mut self) {
        self.close();
    }
}

/// Refreshes or closes one cache without borrowing it.
///
/// While the cache is closed, [`refresh`](Self::refresh) is a no-op.
#[derive(Clone)]
pub struct CacheHandle {
    shared: Arc<Shared>,
}

impl CacheHandle {
    pub fn resource(&self) -> &ResourceName {
        &self.shared.resource
    }

    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Returns whether the request reached an open cache.
    pub fn refresh(&self) -> bool {
        self.shared.refresh()
    }

    /// Closes the cache and waits for its actor to stop.
    pub async fn shutdown(&self) {
        if let Some(task) = self.shared.close() {
            let _ = task.await;
        }
    }
}

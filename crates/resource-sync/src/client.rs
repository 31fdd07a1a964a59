//! # Sync Client
//!
//! [`SyncClient`] is the wiring point of the engine. It is built once per session from
//! the injected backends and hands out caches and the gateway, all sharing one
//! [`InvalidationBus`] so that an acknowledged write refreshes every open cache of the
//! written resource.

use crate::cache::ResourceCache;
use crate::channel::ChangeChannel;
use crate::config::CacheConfig;
use crate::endpoint::GuardedEndpoint;
use crate::fetcher::CollectionFetcher;
use crate::gateway::MutationGateway;
use crate::invalidation::InvalidationBus;
use crate::resource::{ResourceName, ResourceSpec};
use crate::store::{ChangeFeed, RemoteStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct SyncClient {
    fetcher: CollectionFetcher,
    channel: ChangeChannel,
    gateway: MutationGateway,
    bus: InvalidationBus,
    config: CacheConfig,
}

impl SyncClient {
    pub fn new(store: Arc<dyn RemoteStore>, feed: Arc<dyn ChangeFeed>, config: CacheConfig) -> Self {
        let bus = InvalidationBus::new(config.invalidation_capacity);
        Self {
            fetcher: CollectionFetcher::new(store.clone()).with_timeout(config.fetch_timeout()),
            channel: ChangeChannel::new(feed).with_timeout(config.subscribe_timeout()),
            gateway: MutationGateway::new(store).with_invalidations(bus.clone()),
            bus,
            config,
        }
    }

    /// Routes updates and deletes of `guarded` resources through `endpoint`.
    pub fn with_guarded_endpoint<I>(mut self, endpoint: Arc<dyn GuardedEndpoint>, guarded: I) -> Self
    where
        I: IntoIterator<Item = ResourceName>,
    {
        self.gateway = self.gateway.with_guarded_endpoint(endpoint, guarded);
        self
    }

    /// A closed cache for `spec`, wired to this session's invalidations.
    pub fn cache(&self, spec: ResourceSpec) -> ResourceCache {
        ResourceCache::new(spec, self.fetcher.clone(), self.channel.clone())
            .with_reconnect(self.config.resubscribe.clone())
            .with_invalidations(self.bus.clone())
    }

    /// Same as [`cache`](Self::cache), already opened.
    pub fn open(&self, spec: ResourceSpec) -> ResourceCache {
        let mut cache = self.cache(spec);
        cache.open();
        cache
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    pub fn fetcher(&self) -> &CollectionFetcher {
        &self.fetcher
    }

    pub fn invalidations(&self) -> &InvalidationBus {
        &self.bus
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

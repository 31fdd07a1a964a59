//! # Resource Sync
//!
//! Realtime-synchronized resource caches for admin consoles that sit on top of a hosted
//! relational store. Each view opens one cache per resource it displays; the cache keeps
//! an ordered copy of the whole collection and refetches it whenever the store reports a
//! change. Writes never touch a cache directly: they go through the
//! [`MutationGateway`], and the change that follows refreshes every cache on its own.
//!
//! ## Architecture Overview
//!
//! ```text
//!              ┌──────────────┐   signals    ┌──────────────┐
//!   store ────▶│ ChangeChannel│─────────────▶│ CacheActor   │──watch──▶ ResourceCache
//!     ▲        └──────────────┘              │ (per cache)  │            (view)
//!     │        ┌──────────────┐   fetch      │              │
//!     ├────────│CollectionFetcher◀───────────│              │
//!     │        └──────────────┘              └──────▲───────┘
//!     │        ┌──────────────┐  invalidate         │
//!     └────────│MutationGateway│────────────────────┘
//!              └──────▲───────┘
//!                     │ confirm()
//!              ActionCoordinator
//! ```
//!
//! - **Backends** ([`RemoteStore`], [`ChangeFeed`], [`GuardedEndpoint`]) are traits,
//!   injected at construction. [`MemoryStore`] implements all three for tests.
//! - **Caches** ([`ResourceCache`]) are handles over a background actor that owns the
//!   subscription and the coalescing state, and publishes [`CacheState`] snapshots.
//! - **Writes** go through [`MutationGateway`], which validates nothing and mutates no
//!   cache; after an acknowledged write it posts to the [`InvalidationBus`].
//! - **Dialogs** ([`ActionCoordinator`]) run confirm-then-mutate flows and refresh the
//!   displaying cache on success.
//!
//! ## Guarantees
//!
//! - **Whole-collection reads.** Every fetch replaces the collection wholesale, in the
//!   order the store returned it.
//! - **Coalescing.** At most one fetch per cache is in flight; any burst of triggers
//!   during a fetch costs exactly one more.
//! - **No stale writes.** Once a cache is closed, nothing from its old lifetime reaches
//!   its state, including a fetch that lands afterwards.
//! - **Errors are not destructive.** A failed fetch records the error and keeps the
//!   previous collection on screen.
//!
//! ## Quick Start
//!
//! ```rust
//! use resource_sync::{CacheConfig, MemoryStore, OrderBy, Payload, ResourceSpec, SyncClient};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let client = SyncClient::new(store.clone(), store.clone(), CacheConfig::default());
//!
//!     let contacts = client.open(ResourceSpec::new("contacts").order_by(OrderBy::desc("created_at")));
//!     contacts.wait_for(|s| s.revision >= 1).await.unwrap();
//!
//!     let mut payload = Payload::new();
//!     payload.insert("email".into(), json!("someone@example.com"));
//!     client.gateway().create(&"contacts".into(), payload).await.unwrap();
//!
//!     let state = contacts.wait_for(|s| s.collection.len() == 1).await.unwrap();
//!     assert!(!state.collection.is_empty());
//! }
//! ```

mod actor;
pub mod cache;
pub mod channel;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod invalidation;
pub mod memory;
pub mod message;
pub mod record;
pub mod resource;
pub mod store;
pub mod tracing;
pub mod validation;

pub use cache::{CacheHandle, CacheState, ResourceCache};
pub use channel::{ChangeChannel, Subscription, SubscriptionState};
pub use client::SyncClient;
pub use config::{CacheConfig, ReconnectConfig};
pub use coordinator::{
    ActionCoordinator, ActionEvent, ConfirmSurface, CoordinatorError, DeleteRecord,
    DialogState, PatchRecord, RecordAction, SurfaceGuard,
};
pub use endpoint::{EndpointError, GuardedEndpoint, HttpEndpoint};
pub use error::{StoreError, SyncError};
pub use fetcher::CollectionFetcher;
pub use gateway::{MutationGateway, WriteRoute};
pub use invalidation::InvalidationBus;
pub use memory::{MemoryStore, ReadGate};
pub use record::{Collection, Payload, Record, RecordId};
pub use resource::{Direction, OrderBy, Projection, ResourceName, ResourceSpec, SelectQuery};
pub use store::{ChangeFeed, ChangeSignal, RemoteStore};
pub use validation::{FieldError, Schema, ValidationErrors};

//! # Backend Interfaces
//!
//! The engine never talks to a concrete database. It consumes two narrow traits,
//! injected at construction time so tests can swap in [`MemoryStore`](crate::MemoryStore):
//!
//! - [`RemoteStore`]: full ordered reads plus single-row writes.
//! - [`ChangeFeed`]: per-resource change notifications over a connection maintained
//!   outside the engine.
//!
//! Resources whose writes must go through a privileged server route use a third trait,
//! [`GuardedEndpoint`](crate::GuardedEndpoint), defined next to its HTTP implementation.

use crate::error::StoreError;
use crate::record::{Payload, Record, RecordId};
use crate::resource::{ResourceName, SelectQuery};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Opaque "this resource changed" notification. It carries no diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSignal;

/// Read and write access to the authoritative copy of every resource.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns every row of the resource, ordered and projected as requested.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, StoreError>;

    async fn insert(&self, resource: &ResourceName, payload: Payload) -> Result<Record, StoreError>;

    async fn update(
        &self,
        resource: &ResourceName,
        id: &RecordId,
        payload: Payload,
    ) -> Result<Record, StoreError>;

    async fn delete(&self, resource: &ResourceName, id: &RecordId) -> Result<(), StoreError>;
}

/// Source of change notifications.
///
/// Delivery is at-least-once per server-side mutation, possibly in bursts, with no
/// ordering or deduplication. Consumers coalesce.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(
        &self,
        resource: &ResourceName,
    ) -> Result<broadcast::Receiver<ChangeSignal>, StoreError>;
}

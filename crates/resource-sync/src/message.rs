//! # Cache Messages
//!
//! Message types exchanged between a [`ResourceCache`](crate::ResourceCache) handle, its
//! background actor, and the fetch tasks the actor spawns.

use crate::error::SyncError;
use crate::record::Collection;

/// Requests sent from the handle to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCommand {
    /// Refetch now, or once the fetch in flight completes.
    Refresh,
    /// Release the subscription and stop.
    Close,
}

/// Result of one fetch, tagged with the epoch that issued it.
#[derive(Debug)]
pub struct FetchOutcome {
    pub epoch: u64,
    pub result: Result<Collection, SyncError>,
}

//! # Sync Errors
//!
//! This module defines the error types shared by the fetcher, the cache, the change
//! channel and the mutation gateway. By centralizing them, every caller matches on the
//! same taxonomy:
//!
//! | Variant | Raised by | Policy |
//! |---------|-----------|--------|
//! | [`SyncError::RemoteRead`] | fetcher | kept in cache state, retried on next signal |
//! | [`SyncError::Write`] | gateway | returned to the caller, never retried |
//! | [`SyncError::Validation`] | schemas | returned before any network call |
//! | [`SyncError::NotFound`] | gateway | returned to the caller |
//! | [`SyncError::Subscription`] | change channel | logged, subscription retried |
//!
//! Errors that end up in [`CacheState`](crate::CacheState) are `Clone + PartialEq` so they
//! can travel through a `watch` channel and be asserted on in tests.

use crate::record::RecordId;
use crate::resource::ResourceName;
use crate::validation::ValidationErrors;

/// Failures reported by a [`RemoteStore`](crate::RemoteStore) or [`ChangeFeed`](crate::ChangeFeed).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("no record {id} in {resource}")]
    NotFound { resource: ResourceName, id: RecordId },
    #[error("rejected by store: {0}")]
    Rejected(String),
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("failed to read {resource}: {source}")]
    RemoteRead {
        resource: ResourceName,
        #[source]
        source: StoreError,
    },
    #[error("failed to write {resource}: {reason}")]
    Write {
        resource: ResourceName,
        reason: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{resource} record {id} not found")]
    NotFound { resource: ResourceName, id: RecordId },
    #[error("could not subscribe to {resource}: {reason}")]
    Subscription {
        resource: ResourceName,
        reason: String,
    },
    #[error("cache closed")]
    CacheClosed,
}

impl SyncError {
    /// Maps a store write failure, keeping `NotFound` distinguishable.
    pub(crate) fn from_write(resource: &ResourceName, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, id } => SyncError::NotFound { resource, id },
            other => SyncError::Write {
                resource: resource.clone(),
                reason: other.to_string(),
            },
        }
    }
}

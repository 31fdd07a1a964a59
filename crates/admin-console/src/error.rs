//! Error type shared by the console's clients, views and lifecycle.

use crate::config::ConfigError;
use resource_sync::{CoordinatorError, EndpointError, RecordId, ResourceName, SyncError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("could not encode {resource} payload: {reason}")]
    Encode {
        resource: ResourceName,
        reason: String,
    },
    #[error("could not decode {resource} record {id}: {reason}")]
    Decode {
        resource: ResourceName,
        id: RecordId,
        reason: String,
    },
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AdminError {
    /// Field-level errors, when the write was rejected before reaching the network.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            AdminError::Validation(errors) | AdminError::Sync(SyncError::Validation(errors)) => {
                Some(errors)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AdminError::Sync(SyncError::NotFound { .. })
                | AdminError::Coordinator(CoordinatorError::Action(SyncError::NotFound { .. }))
        )
    }
}

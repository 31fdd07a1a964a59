//! # Dialog / Action Coordinator
//!
//! Owns the state machine around one confirm-then-mutate interaction, such as "delete this
//! contact?" or "mark this submission read". It never keeps a second copy of the record
//! collection: the record being acted on is addressed by id, and a successful action ends
//! with a [`CacheHandle::refresh`] on the cache that displays the resource.
//!
//! ```text
//! Idle ──request(id)──▶ Confirming ──confirm()──▶ InFlight ──ok──▶ Succeeded ──▶ Idle
//!                          │   ▲                      │
//!                   cancel()   └──── Failed ◀──err────┘
//!                          ▼
//!                        Idle
//! ```
//!
//! `Succeeded` and `Failed` are transient: they are reported as [`ActionEvent`]s and the
//! machine moves on within the same call.
//!
//! ## Confirmation surface
//!
//! Whatever renders the prompt implements [`ConfirmSurface`]. The coordinator holds it
//! through a [`SurfaceGuard`] for as long as the dialog is open, and the guard releases it
//! on every exit path: success, cancel, reset, or the coordinator being dropped mid-way.

use crate::cache::CacheHandle;
use crate::error::SyncError;
use crate::gateway::MutationGateway;
use crate::record::{Payload, Record, RecordId};
use crate::resource::ResourceName;
use crate::validation::Schema;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Idle,
    Confirming {
        target: RecordId,
        /// Message of the last failed attempt, shown inside the open dialog.
        error: Option<String>,
    },
    InFlight {
        target: RecordId,
    },
    Succeeded {
        target: RecordId,
    },
    Failed {
        target: RecordId,
        error: String,
    },
}

impl DialogState {
    pub fn target(&self) -> Option<&RecordId> {
        match self {
            DialogState::Idle => None,
            DialogState::Confirming { target, .. }
            | DialogState::InFlight { target }
            | DialogState::Succeeded { target }
            | DialogState::Failed { target, .. } => Some(target),
        }
    }
}

/// Completion notices sent upward to the owning view.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    Succeeded { target: RecordId },
    Failed { target: RecordId, error: String },
    Cancelled { target: RecordId },
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("a dialog for {0} is already open")]
    Busy(RecordId),
    #[error("no dialog awaiting confirmation")]
    NotConfirming,
    #[error(transparent)]
    Action(#[from] SyncError),
}

/// Renders the confirmation prompt.
pub trait ConfirmSurface: Send + Sync {
    fn show(&self, prompt: &str);

    fn show_error(&self, message: &str);

    fn release(&self);
}

/// Holds a [`ConfirmSurface`] open; dropping the guard releases it.
pub struct SurfaceGuard {
    surface: Arc<dyn ConfirmSurface>,
}

impl SurfaceGuard {
    pub fn acquire(surface: Arc<dyn ConfirmSurface>, prompt: &str) -> Self {
        surface.show(prompt);
        Self { surface }
    }

    pub fn show_error(&self, message: &str) {
        self.surface.show_error(message);
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.surface.release();
    }
}

/// The mutation a dialog performs once confirmed.
#[async_trait]
pub trait RecordAction: Send + Sync {
    type Output: Send;

    fn resource(&self) -> &ResourceName;

    /// Prompt shown while confirming.
    fn prompt(&self, target: &RecordId) -> String;

    async fn perform(
        &self,
        gateway: &MutationGateway,
        target: &RecordId,
    ) -> Result<Self::Output, SyncError>;
}

/// Deletes the target record.
#[derive(Debug, Clone)]
pub struct DeleteRecord {
    pub resource: ResourceName,
}

impl DeleteRecord {
    pub fn new(resource: impl Into<ResourceName>) -> Self {
        Self {
            resource: resource.into(),
        }
    }
}

#[async_trait]
impl RecordAction for DeleteRecord {
    type Output = ();

    fn resource(&self) -> &ResourceName {
        &self.resource
    }

    fn prompt(&self, target: &RecordId) -> String {
        format!("Delete {} {}? This cannot be undone.", self.resource, target)
    }

    async fn perform(&self, gateway: &MutationGateway, target: &RecordId) -> Result<(), SyncError> {
        gateway.delete(&self.resource, target).await
    }
}

/// Applies a fixed patch to the target record, e.g. `{ "read": true }`.
///
/// The patch goes through `schema` on every confirm; a rejected patch fails with
/// [`SyncError::Validation`] and nothing is written.
#[derive(Clone)]
pub struct PatchRecord {
    pub resource: ResourceName,
    pub label: String,
    pub patch: Payload,
    schema: Arc<dyn Schema<Output = Payload> + Send + Sync>,
}

impl PatchRecord {
    pub fn new(
        resource: impl Into<ResourceName>,
        label: impl Into<String>,
        patch: Payload,
        schema: impl Schema<Output = Payload> + Send + Sync + 'static,
    ) -> Self {
        Self {
            resource: resource.into(),
            label: label.into(),
            patch,
            schema: Arc::new(schema),
        }
    }
}

impl std::fmt::Debug for PatchRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchRecord")
            .field("resource", &self.resource)
            .field("label", &self.label)
            .field("patch", &self.patch)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordAction for PatchRecord {
    type Output = Record;

    fn resource(&self) -> &ResourceName {
        &self.resource
    }

    fn prompt(&self, target: &RecordId) -> String {
        format!("{} {} {}?", self.label, self.resource, target)
    }

    async fn perform(
        &self,
        gateway: &MutationGateway,
        target: &RecordId,
    ) -> Result<Self::Output, SyncError> {
        let patch = self.schema.parse(&self.patch)?;
        gateway.update(&self.resource, target, patch).await
    }
}

/// Confirm-then-mutate state machine for one kind of action.
pub struct ActionCoordinator<A: RecordAction> {
    action: A,
    gateway: MutationGateway,
    surface: Arc<dyn ConfirmSurface>,
    cache: CacheHandle,
    events: Option<mpsc::UnboundedSender<ActionEvent>>,
    state: DialogState,
    guard: Option<SurfaceGuard>,
}

impl<A: RecordAction> ActionCoordinator<A> {
    pub fn new(
        action: A,
        gateway: MutationGateway,
        surface: Arc<dyn ConfirmSurface>,
        cache: CacheHandle,
    ) -> Self {
        Self {
            action,
            gateway,
            surface,
            cache,
            events: None,
            state: DialogState::Idle,
            guard: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<ActionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// Opens the dialog for `target`. Only valid from `Idle`.
    pub fn request(&mut self, target: RecordId) -> Result<(), CoordinatorError> {
        if let Some(current) = self.state.target() {
            return Err(CoordinatorError::Busy(current.clone()));
        }
        let prompt = self.action.prompt(&target);
        debug!(resource = %self.action.resource(), %target, "Confirm requested");
        self.guard = Some(SurfaceGuard::acquire(self.surface.clone(), &prompt));
        self.state = DialogState::Confirming {
            target,
            error: None,
        };
        Ok(())
    }

    /// Closes an open dialog without acting. Also recovers a dialog whose `confirm` was
    /// abandoned mid-flight. A no-op when `Idle`.
    pub fn cancel(&mut self) {
        if let DialogState::Confirming { target, .. } | DialogState::InFlight { target } =
            &self.state
        {
            let target = target.clone();
            debug!(resource = %self.action.resource(), %target, "Cancelled");
            self.guard = None;
            self.state = DialogState::Idle;
            self.emit(ActionEvent::Cancelled { target });
        }
    }

    /// Performs the action for the confirmed target.
    ///
    /// On success the dialog closes and the displaying cache is refreshed. On failure the
    /// dialog stays open with the error and the same target, ready for a retry.
    ///
    /// Dropping the returned future before it completes leaves the dialog `InFlight`;
    /// [`cancel`](Self::cancel) or [`reset`](Self::reset) brings it back to `Idle`.
    pub async fn confirm(&mut self) -> Result<A::Output, CoordinatorError> {
        let target = match &self.state {
            DialogState::Confirming { target, .. } => target.clone(),
            _ => return Err(CoordinatorError::NotConfirming),
        };
        self.state = DialogState::InFlight {
            target: target.clone(),
        };

        match self.action.perform(&self.gateway, &target).await {
            Ok(output) => {
                self.state = DialogState::Succeeded {
                    target: target.clone(),
                };
                info!(resource = %self.action.resource(), %target, "Action succeeded");
                self.cache.refresh();
                self.guard = None;
                self.emit(ActionEvent::Succeeded { target });
                self.state = DialogState::Idle;
                Ok(output)
            }
            Err(error) => {
                let message = error.to_string();
                warn!(resource = %self.action.resource(), %target, %message, "Action failed");
                self.state = DialogState::Failed {
                    target: target.clone(),
                    error: message.clone(),
                };
                if let Some(guard) = &self.guard {
                    guard.show_error(&message);
                }
                self.emit(ActionEvent::Failed {
                    target: target.clone(),
                    error: message.clone(),
                });
                self.state = DialogState::Confirming {
                    target,
                    error: Some(message),
                };
                Err(CoordinatorError::Action(error))
            }
        }
    }

    /// Returns to `Idle` from any state, releasing the surface.
    pub fn reset(&mut self) {
        self.guard = None;
        self.state = DialogState::Idle;
    }

    fn emit(&self, event: ActionEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

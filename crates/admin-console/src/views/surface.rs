use resource_sync::ConfirmSurface;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// A [`ConfirmSurface`] that renders prompts as log lines. Used by the demo binary and
/// by headless runs.
#[derive(Debug, Default)]
pub struct LogSurface {
    open: AtomicBool,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl ConfirmSurface for LogSurface {
    fn show(&self, prompt: &str) {
        self.open.store(true, Ordering::SeqCst);
        info!(%prompt, "Confirmation requested");
    }

    fn show_error(&self, message: &str) {
        warn!(%message, "Action failed, dialog kept open");
    }

    fn release(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!("Dialog closed");
        }
    }
}

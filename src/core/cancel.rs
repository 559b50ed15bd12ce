use crate::utils::error::{RegistrationError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation for a registration attempt.
///
/// Clones share the same flag. The flow checks it before every network call;
/// a request already in flight is left to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            tracing::warn!("🛑 Registration attempt cancelled by caller");
            return Err(RegistrationError::Cancelled);
        }
        Ok(())
    }
}

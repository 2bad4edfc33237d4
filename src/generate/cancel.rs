use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Shared interrupt flag, checked between jobs and placement restarts.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` if the token was already set.
    pub fn cancel(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    /// `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(CutPasteError::Cancelled)` once cancelled.
    pub fn check(&self) -> CutPasteResult<()> {
        if self.is_cancelled() {
            Err(CutPasteError::Cancelled)
        } else {
            Ok(())
        }
    }
}

//! Cooperative cancellation for long-running extraction and for the
//! terminal loop's Ctrl-C handling.

use crate::error::{ReaderError, Result};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ReaderError::Cancelled { stage });
        }
        Ok(())
    }
}

/// Convenience for call sites that hold an optional token.
pub(crate) fn check(cancel: Option<&CancellationToken>, stage: &'static str) -> Result<()> {
    match cancel {
        Some(token) => token.check_cancelled(stage),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(observer.check_cancelled("before").is_ok());

        token.cancel();

        assert!(observer.is_cancelled());
        match observer.check_cancelled("pdf_page") {
            Err(ReaderError::Cancelled { stage }) => assert_eq!(stage, "pdf_page"),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn missing_token_never_cancels() {
        assert!(check(None, "anything").is_ok());
    }
}

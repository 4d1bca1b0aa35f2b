//! Cooperative cancellation for pipeline runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::application::ApplicationError;

/// Flag plus optional deadline, checked by the pipeline before each entry.
///
/// Clones share the flag, so a signal handler or another thread can hold
/// one clone and trip it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also trips once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(Cancelled)` once tripped.
    pub fn check(&self) -> Result<(), ApplicationError> {
        if self.flag.load(Ordering::SeqCst) {
            return Err(ApplicationError::Cancelled {
                reason: "cancelled by caller".into(),
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ApplicationError::Cancelled {
                reason: "deadline exceeded".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(token.check().is_ok());
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ApplicationError::Cancelled { .. })));
    }

    #[test]
    fn past_deadline_trips() {
        let token = CancellationToken::new().deadline_at(Instant::now());
        assert!(token.is_cancelled());
        assert!(CancellationToken::with_timeout(Duration::from_secs(3600)).check().is_ok());
    }
}

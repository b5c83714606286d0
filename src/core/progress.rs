//! # Progress and Cancellation
//!
//! [`Progress`] is the completion fraction the orchestrator publishes after every item.
//! [`CancellationToken`] lets another thread (a signal handler, a UI button) stop a
//! batch between items.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Items completed out of the batch total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in [0, 1]. An empty batch is complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed.min(self.total)) as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Shared flag checked by the orchestrator before each item.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_bounds() {
        assert_eq!(Progress { completed: 0, total: 4 }.fraction(), 0.0);
        assert_eq!(Progress { completed: 1, total: 4 }.fraction(), 0.25);
        assert_eq!(Progress { completed: 4, total: 4 }.fraction(), 1.0);
        assert_eq!(Progress { completed: 0, total: 0 }.fraction(), 1.0);
        assert!(Progress { completed: 4, total: 4 }.is_complete());
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}

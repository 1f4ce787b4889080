//! Cooperative cancellation for long-running operations.
//!
//! The Hough accumulators and the active contour loop have costs that scale
//! with the parameter grid and the image content; both check a
//! [`CancelToken`] at their outer loops so a caller can abandon a run that
//! turned out too expensive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    flag: AtomicBool,
    deadline: Option<Instant>,
}

/// A cloneable cancellation handle with an optional deadline.
///
/// # Examples
///
/// ```
/// use vislab_imgproc::cancel::CancelToken;
///
/// let token = CancelToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct CancelToken(Arc<Inner>);

impl CancelToken {
    /// A token that only fires when [`CancelToken::cancel`] is called.
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            flag: AtomicBool::new(false),
            deadline: None,
        }))
    }

    /// A token that additionally fires once `budget` has elapsed.
    pub fn with_deadline(budget: Duration) -> Self {
        Self(Arc::new(Inner {
            flag: AtomicBool::new(false),
            deadline: Some(Instant::now() + budget),
        }))
    }

    /// Request cancellation. All clones observe the request.
    pub fn cancel(&self) {
        self.0.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        if self.0.flag.load(Ordering::Relaxed) {
            return true;
        }
        match self.0.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn elapsed_deadline_fires() {
        let token = CancelToken::with_deadline(Duration::from_millis(0));
        assert!(token.is_cancelled());
    }
}

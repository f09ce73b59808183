//! Debounce timer for autosave.
//!
//! The host calls [`Debouncer::arm`] on every edit and polls
//! [`Debouncer::fire`] from its event loop. A burst of edits collapses into a
//! single fire once edits pause for the interval.

use std::time::{Duration, Instant};

/// Default quiet period before an autosave.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Single-shot, cancellable deadline.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    /// When the pending fire is due, if any.
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule a fire one interval after `now`, replacing any pending one.
    ///
    /// An interval too large to represent as an instant never fires.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = now.checked_add(self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once per arm, when `now` has reached the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(AUTOSAVE_INTERVAL)
    }
}

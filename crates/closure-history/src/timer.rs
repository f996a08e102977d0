//! Continuous eye-closure timer

use std::time::{Duration, Instant};

/// Accumulates how long the eyes have been closed without interruption
///
/// Each update adds the wall-clock time since the previous update while the
/// eyes stay closed; the first open sample resets it to zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClosureTimer {
    closed_for: Duration,
    last_update: Option<Instant>,
}

impl ClosureTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample taken at `now` and return the closed duration
    pub fn update(&mut self, is_closed: bool, now: Instant) -> Duration {
        let dt = self
            .last_update
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_update = Some(now);

        if is_closed {
            self.closed_for += dt;
        } else {
            self.closed_for = Duration::ZERO;
        }
        self.closed_for
    }

    pub fn closed_for(&self) -> Duration {
        self.closed_for
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

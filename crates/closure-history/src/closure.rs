//! Eye-closure window and PERCLOS

use crate::SlidingWindow;

/// Window of per-frame "eye closed" samples
///
/// Keeps a running closed count so PERCLOS is O(1).
#[derive(Debug, Clone)]
pub struct ClosureWindow {
    window: SlidingWindow<bool>,
    closed: usize,
}

impl ClosureWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: SlidingWindow::new(capacity),
            closed: 0,
        }
    }

    pub fn push(&mut self, is_closed: bool) {
        if is_closed {
            self.closed += 1;
        }
        if let Some(true) = self.window.push(is_closed) {
            self.closed -= 1;
        }
    }

    /// Share of closed samples in the window, 0.0 when empty
    pub fn perclos(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.closed as f64 / self.window.len() as f64
    }

    pub fn closed_count(&self) -> usize {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.closed = 0;
    }
}

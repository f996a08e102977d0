//! Detection throughput counter

use std::time::{Duration, Instant};

/// Counts completed detections per second
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames_in_window: u32,
    window_start: Option<Instant>,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed detection and return the latest published rate
    pub fn tick(&mut self, now: Instant) -> u32 {
        let start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;

        if now.saturating_duration_since(start) >= Duration::from_secs(1) {
            self.fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_start = Some(now);
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publishes_after_one_second() {
        let start = Instant::now();
        let mut counter = FpsCounter::new();

        for i in 0..15 {
            counter.tick(start + Duration::from_millis(i * 66));
        }
        assert_eq!(counter.fps(), 0);

        assert_eq!(counter.tick(start + Duration::from_millis(1000)), 16);
        counter.reset();
        assert_eq!(counter.fps(), 0);
    }
}

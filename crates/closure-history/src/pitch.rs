//! Head-pitch window and nodding statistics

use crate::SlidingWindow;

/// Statistics over the pitch window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PitchStats {
    /// Number of samples the statistics were computed from
    pub samples: usize,
    pub mean: f64,
    /// Population variance about the mean
    pub variance: f64,
    /// Mean crossings that overshoot the mean by at least the amplitude
    pub crossings: usize,
}

impl PitchStats {
    /// Compute statistics from pitch samples, oldest first
    pub fn compute<'a>(values: impl Iterator<Item = &'a f64> + Clone, amplitude: f64) -> Self {
        let (sum, n) = values.clone().fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
        if n == 0 {
            return Self::default();
        }
        let mean = sum / n as f64;

        let variance = values
            .clone()
            .map(|&v| (v - mean) * (v - mean))
            .sum::<f64>()
            / n as f64;

        // Hysteresis: a crossing only counts once the sample clears the
        // mean by `amplitude` on the other side.
        let mut iter = values;
        let mut crossings = 0;
        if let Some(&first) = iter.next() {
            let mut above = first > mean;
            for &p in iter {
                if above && p < mean - amplitude {
                    crossings += 1;
                    above = false;
                } else if !above && p > mean + amplitude {
                    crossings += 1;
                    above = true;
                }
            }
        }

        Self {
            samples: n,
            mean,
            variance,
            crossings,
        }
    }
}

/// Window of head-pitch samples
#[derive(Debug, Clone)]
pub struct PitchWindow {
    window: SlidingWindow<f64>,
}

impl PitchWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: SlidingWindow::new(capacity),
        }
    }

    pub fn push(&mut self, pitch: f64) {
        self.window.push(pitch);
    }

    pub fn stats(&self, amplitude: f64) -> PitchStats {
        PitchStats::compute(self.window.iter(), amplitude)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

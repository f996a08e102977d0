//! Closure/nodding history tracker

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ClosureWindow, PitchStats, PitchWindow};

/// History tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Eye-closure window capacity (samples)
    pub closure_capacity: usize,
    /// Head-pitch window capacity (samples)
    pub pitch_capacity: usize,
    /// Pitch samples required before nodding can be reported
    pub nodding_min_samples: usize,
    /// Pitch variance above which the head counts as nodding
    pub nodding_variance: f64,
    /// Overshoot required for a pitch crossing to count
    pub crossing_amplitude: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            closure_capacity: 300,
            pitch_capacity: 150,
            nodding_min_samples: 30,
            nodding_variance: 0.005,
            crossing_amplitude: 0.05,
        }
    }
}

/// Sliding-window history of eye closure and head pitch
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    config: HistoryConfig,
    closures: ClosureWindow,
    pitches: PitchWindow,
}

impl HistoryTracker {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            closures: ClosureWindow::new(config.closure_capacity),
            pitches: PitchWindow::new(config.pitch_capacity),
            config,
        }
    }

    pub fn push_closure(&mut self, is_closed: bool) {
        self.closures.push(is_closed);
    }

    pub fn push_pitch(&mut self, pitch: f64) {
        self.pitches.push(pitch);
    }

    /// PERCLOS over the closure window, 0.0 when empty
    pub fn perclos(&self) -> f64 {
        self.closures.perclos()
    }

    pub fn pitch_stats(&self) -> PitchStats {
        self.pitches.stats(self.config.crossing_amplitude)
    }

    /// Coarse "restless head" indicator from pitch variance
    pub fn is_nodding(&self) -> bool {
        if self.pitches.len() < self.config.nodding_min_samples {
            return false;
        }
        let stats = self.pitch_stats();
        let nodding = stats.variance > self.config.nodding_variance;
        if nodding {
            debug!(
                "Nodding: pitch variance {:.4} (mean {:.3}, {} crossings)",
                stats.variance, stats.mean, stats.crossings
            );
        }
        nodding
    }

    pub fn closure_len(&self) -> usize {
        self.closures.len()
    }

    pub fn pitch_len(&self) -> usize {
        self.pitches.len()
    }

    /// Drop all history (session start/restart)
    ///
    /// Only the windows live here. The continuous-closed duration belongs to
    /// the fusion state and is cleared by `FusionEngine::reset`; a session
    /// reset runs both in the same step.
    pub fn reset(&mut self) {
        self.closures.clear();
        self.pitches.clear();
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

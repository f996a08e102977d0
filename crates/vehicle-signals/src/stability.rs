//! Motion stability from accelerometer samples

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw accelerometer sample (m/s²)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Stability estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Low-pass coefficient isolating gravity
    pub gravity_alpha: f32,
    /// Linear acceleration magnitude above which the vehicle is bouncing (m/s²)
    pub bump_threshold: f32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            gravity_alpha: 0.8,
            bump_threshold: 2.0,
        }
    }
}

/// Edge-triggered vehicle stability estimator
///
/// Separates gravity with a low-pass filter and judges the remaining linear
/// acceleration. Reports only changes of the stable flag.
#[derive(Debug, Clone)]
pub struct StabilityEstimator {
    config: StabilityConfig,
    gravity: Option<AccelSample>,
    stable: bool,
}

impl StabilityEstimator {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            config,
            gravity: None,
            stable: true,
        }
    }

    /// Feed a sample; returns the new flag when stability changed
    pub fn observe(&mut self, sample: AccelSample) -> Option<bool> {
        let alpha = self.config.gravity_alpha;
        // Seed with the first sample so the filter starts settled
        let prev = self.gravity.unwrap_or(sample);
        let gravity = AccelSample {
            x: alpha * prev.x + (1.0 - alpha) * sample.x,
            y: alpha * prev.y + (1.0 - alpha) * sample.y,
            z: alpha * prev.z + (1.0 - alpha) * sample.z,
        };
        self.gravity = Some(gravity);

        let linear = AccelSample {
            x: sample.x - gravity.x,
            y: sample.y - gravity.y,
            z: sample.z - gravity.z,
        };
        let magnitude = linear.magnitude();
        let stable = magnitude < self.config.bump_threshold;

        if stable == self.stable {
            return None;
        }
        debug!("Stability changed -> {} (linear {:.2} m/s²)", stable, magnitude);
        self.stable = stable;
        Some(stable)
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn reset(&mut self) {
        self.gravity = None;
        self.stable = true;
    }
}

impl Default for StabilityEstimator {
    fn default() -> Self {
        Self::new(StabilityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST: AccelSample = AccelSample::new(0.0, 0.0, 9.81);

    #[test]
    fn test_resting_is_stable() {
        let mut estimator = StabilityEstimator::default();
        for _ in 0..50 {
            assert_eq!(estimator.observe(REST), None);
        }
        assert!(estimator.is_stable());
    }

    #[test]
    fn test_bump_reports_edges_once() {
        let mut estimator = StabilityEstimator::default();
        for _ in 0..10 {
            estimator.observe(REST);
        }

        // Sudden 5 m/s² vertical jolt
        assert_eq!(estimator.observe(AccelSample::new(0.0, 0.0, 14.81)), Some(false));
        assert!(!estimator.is_stable());

        let mut recovered = None;
        for _ in 0..50 {
            if let Some(flag) = estimator.observe(REST) {
                recovered.get_or_insert(flag);
            }
        }
        assert_eq!(recovered, Some(true));
        assert!(estimator.is_stable());
    }

    #[test]
    fn test_reset() {
        let mut estimator = StabilityEstimator::default();
        estimator.observe(REST);
        estimator.observe(AccelSample::new(6.0, 0.0, 9.81));
        estimator.reset();
        assert!(estimator.is_stable());
        assert_eq!(estimator.observe(REST), None);
    }
}

//! Context factors and effective thresholds

use serde::{Deserialize, Serialize};

use crate::{FusionConfig, FusionState};

/// Multiplicative context factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextFactors {
    pub stability: f64,
    pub speed: f64,
    pub heart_rate: f64,
}

impl ContextFactors {
    pub fn from_state(state: &FusionState, config: &FusionConfig) -> Self {
        let stability = if state.vehicle_stable {
            1.0
        } else {
            config.unstable_factor
        };

        let speed = if state.speed_kmh > config.high_speed_kmh {
            config.high_speed_factor
        } else if state.speed_kmh < config.low_speed_kmh {
            config.low_speed_factor
        } else {
            1.0
        };

        let heart_rate = match state.heart_rate_bpm {
            Some(bpm) if bpm > 0.0 && bpm < config.low_heart_rate_bpm => {
                config.low_heart_rate_factor
            }
            _ => 1.0,
        };

        Self {
            stability,
            speed,
            heart_rate,
        }
    }

    /// Combined sensitivity (speed × heart rate)
    pub fn sensitivity(&self) -> f64 {
        self.speed * self.heart_rate
    }
}

/// Thresholds after context adjustment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveThresholds {
    pub ear: f64,
    pub duration_secs: f64,
    pub perclos: f64,
}

impl EffectiveThresholds {
    /// Higher sensitivity raises the EAR threshold and shortens the
    /// duration/PERCLOS limits; instability lengthens the duration.
    pub fn compute(factors: &ContextFactors, config: &FusionConfig) -> Self {
        let sensitivity = factors.sensitivity();
        Self {
            ear: config.base_ear_threshold * sensitivity,
            duration_secs: (config.base_duration_secs / sensitivity) * factors.stability,
            perclos: config.base_perclos_threshold / sensitivity,
        }
    }
}

//! Fusion configuration

use serde::{Deserialize, Serialize};

/// Fusion thresholds and context factors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// EAR threshold for the instantaneous closure check
    pub base_ear_threshold: f64,
    /// Continuous closure that counts as micro-sleep (seconds)
    pub base_duration_secs: f64,
    /// PERCLOS that counts as drowsiness
    pub base_perclos_threshold: f64,

    /// Above this speed thresholds get stricter (km/h)
    pub high_speed_kmh: f64,
    /// Below this speed thresholds get more lenient (km/h)
    pub low_speed_kmh: f64,
    pub high_speed_factor: f64,
    pub low_speed_factor: f64,

    /// Heart rate below which thresholds get stricter (bpm)
    pub low_heart_rate_bpm: f64,
    pub low_heart_rate_factor: f64,

    /// Duration multiplier while the vehicle is unstable
    pub unstable_factor: f64,

    /// Heart rate below which physiological fatigue is possible (bpm)
    pub physiological_bpm: f64,
    /// PERCLOS that must co-occur with a low heart rate
    pub physiological_perclos: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            base_ear_threshold: 0.15,
            base_duration_secs: 1.5,
            base_perclos_threshold: 0.4,
            high_speed_kmh: 80.0,
            low_speed_kmh: 20.0,
            high_speed_factor: 1.2,
            low_speed_factor: 0.8,
            low_heart_rate_bpm: 55.0,
            low_heart_rate_factor: 1.1,
            unstable_factor: 1.5,
            physiological_bpm: 50.0,
            physiological_perclos: 0.2,
        }
    }
}

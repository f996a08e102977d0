//! Vehicle Signal Conditioning
//!
//! Cleans up the non-vision inputs before they reach the fusion engine:
//! - GPS speed conversion and range checking
//! - Heart-rate sanity checks
//! - Accelerometer-based motion stability

mod sample;
mod stability;

pub use sample::{heart_rate_bpm, speed_kmh, speed_kmh_from_mps};
pub use stability::{AccelSample, StabilityConfig, StabilityEstimator};

use thiserror::Error;

/// Signal conditioning errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// NaN or infinite reading
    #[error("{field} reading is not finite: {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Reading below the physical minimum
    #[error("{field} reading {value} is negative")]
    Negative { field: &'static str, value: f64 },
}

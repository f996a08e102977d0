//! Scalar signal checks

use crate::SignalError;

fn checked(field: &'static str, value: f64) -> Result<f64, SignalError> {
    if !value.is_finite() {
        return Err(SignalError::NonFinite { field, value });
    }
    if value < 0.0 {
        return Err(SignalError::Negative { field, value });
    }
    Ok(value)
}

/// Validate a speed reading in km/h
pub fn speed_kmh(value: f64) -> Result<f64, SignalError> {
    checked("speed", value)
}

/// Convert a GPS speed in m/s to km/h
pub fn speed_kmh_from_mps(mps: f64) -> Result<f64, SignalError> {
    checked("speed", mps).map(|v| v * 3.6)
}

/// Validate a heart-rate reading; zero stays zero and means "unknown"
pub fn heart_rate_bpm(value: f64) -> Result<f64, SignalError> {
    checked("heart_rate", value)
}

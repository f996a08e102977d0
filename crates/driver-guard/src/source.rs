//! Landmark detector boundary

use image::RgbImage;
use landmark_features::LandmarkSet;
use std::future::Future;
use thiserror::Error;

/// Landmark detector errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Detector initialization failed: {0}")]
    Init(String),

    #[error("Detection failed: {0}")]
    Detection(String),
}

/// Camera frame offered to the session
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Capture timestamp (milliseconds)
    pub captured_at_ms: u64,
}

impl Frame {
    pub fn new(image: RgbImage, captured_at_ms: u64) -> Self {
        Self {
            image,
            captured_at_ms,
        }
    }
}

/// External face-landmark detector
///
/// Resolves to the landmarks of the most prominent face, or an error. The
/// session keeps at most one request outstanding.
///
/// A request that stalls past the scheduler timeout is abandoned, not
/// cancelled: its task and frame stay alive until the future resolves.
/// Implementations should bound their own latency; the session counts
/// abandoned requests in `Telemetry::abandoned_detections`.
///
/// Set the returned `LandmarkSet` timestamp to the frame's capture time (or
/// leave it 0) so closure durations follow capture spacing.
pub trait LandmarkSource: Send + Sync + 'static {
    fn detect(&self, frame: Frame) -> impl Future<Output = Result<LandmarkSet, DetectorError>> + Send;
}

/// Placeholder for sessions whose landmarks are pushed by the caller
pub(crate) struct NoDetector;

impl LandmarkSource for NoDetector {
    async fn detect(&self, _frame: Frame) -> Result<LandmarkSet, DetectorError> {
        Err(DetectorError::Detection("no detector attached".into()))
    }
}

//! Landmark Feature Extraction
//!
//! Turns one face-mesh landmark set into per-frame fatigue features:
//! - Eye aspect ratio (EAR) for each eye
//! - Head yaw ratio and pitch
//! - Effective EAR robust to head turn and single-eye occlusion
//! - Speed and light adjusted closure threshold

pub mod config;
pub mod ear;
pub mod extractor;
pub mod landmarks;
pub mod light;
pub mod pose;

pub use config::{FaceMeshIndices, FeatureConfig};
pub use ear::{eye_aspect_ratio, EyeSelection};
pub use extractor::{FeatureExtractor, FrameContext, FrameFeatures};
pub use landmarks::{LandmarkSet, Point2};
pub use light::{average_luma, LightConfig, LowLightEstimator};
pub use pose::HeadPose;

use thiserror::Error;

/// Feature extraction error types
///
/// Every variant means "no usable face in this frame": the caller drops the
/// frame without touching any history.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Landmark set is empty")]
    Empty,

    #[error("Landmark {index} missing (set has {len} points)")]
    MissingLandmark { index: usize, len: usize },

    #[error("Degenerate eye geometry: corner distance is zero")]
    DegenerateEye,
}

//! Eye aspect ratio and eye selection

use crate::{FeatureConfig, FeatureError, LandmarkSet};

/// Compute EAR for one eye
///
/// `EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|)`, with `eye` holding the mesh
/// indices of p1..p6.
pub fn eye_aspect_ratio(landmarks: &LandmarkSet, eye: &[usize; 6]) -> Result<f64, FeatureError> {
    let [p1, p2, p3, p4, p5, p6] = eye.map(|i| landmarks.get(i));
    let (p1, p2, p3, p4, p5, p6) = (p1?, p2?, p3?, p4?, p5?, p6?);

    let horizontal = p1.distance(&p4);
    if horizontal == 0.0 {
        return Err(FeatureError::DegenerateEye);
    }

    Ok((p2.distance(&p6) + p3.distance(&p5)) / (2.0 * horizontal))
}

/// Which eye drives the effective EAR for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeSelection {
    /// Head turned so only the left eye is reliable
    Left,
    /// Head turned so only the right eye is reliable
    Right,
    /// Near-frontal: take the more open eye
    Max,
}

impl EyeSelection {
    pub fn for_yaw(yaw_ratio: f64, config: &FeatureConfig) -> Self {
        if yaw_ratio > config.right_eye_only_above {
            EyeSelection::Right
        } else if yaw_ratio < config.left_eye_only_below {
            EyeSelection::Left
        } else {
            EyeSelection::Max
        }
    }

    /// Fatigue closes both eyes, so in the frontal case the larger EAR
    /// rejects a single glared or occluded eye.
    pub fn apply(self, left_ear: f64, right_ear: f64) -> f64 {
        match self {
            EyeSelection::Left => left_ear,
            EyeSelection::Right => right_ear,
            EyeSelection::Max => left_ear.max(right_ear),
        }
    }
}

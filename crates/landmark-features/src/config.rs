//! Feature extraction configuration

use serde::{Deserialize, Serialize};

/// Face-mesh indices used by the extractor (468-point topology)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceMeshIndices {
    /// Left eye p1..p6 (corner, upper, upper, corner, lower, lower)
    pub left_eye: [usize; 6],
    /// Right eye p1..p6
    pub right_eye: [usize; 6],
    pub nose: usize,
    /// Subject's left cheek (image right)
    pub left_cheek: usize,
    /// Subject's right cheek (image left)
    pub right_cheek: usize,
}

impl Default for FaceMeshIndices {
    fn default() -> Self {
        Self {
            left_eye: [33, 160, 158, 133, 153, 144],
            right_eye: [362, 385, 387, 263, 373, 380],
            nose: 1,
            left_cheek: 454,
            right_cheek: 234,
        }
    }
}

impl FaceMeshIndices {
    /// Every index the extractor reads
    pub fn required(&self) -> impl Iterator<Item = usize> + '_ {
        self.left_eye
            .iter()
            .chain(self.right_eye.iter())
            .copied()
            .chain([self.nose, self.left_cheek, self.right_cheek])
    }
}

/// Feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Base EAR below which an eye counts as closed
    pub base_ear_threshold: f64,

    /// Speed above which the closure threshold is raised (km/h)
    pub high_speed_kmh: f64,

    /// Threshold increase above `high_speed_kmh`
    pub high_speed_boost: f64,

    /// Threshold decrease in low light
    pub low_light_relief: f64,

    /// Lowest allowed closure threshold
    pub threshold_floor: f64,

    /// Yaw ratio denominator offset
    pub yaw_epsilon: f64,

    /// Above this yaw ratio only the right eye is trusted
    pub right_eye_only_above: f64,

    /// Below this yaw ratio only the left eye is trusted
    pub left_eye_only_below: f64,

    pub indices: FaceMeshIndices,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            base_ear_threshold: 0.20,
            high_speed_kmh: 80.0,
            high_speed_boost: 0.05,
            low_light_relief: 0.03,
            threshold_floor: 0.12,
            yaw_epsilon: 0.001,
            right_eye_only_above: 1.5,
            left_eye_only_below: 0.66,
            indices: FaceMeshIndices::default(),
        }
    }
}

//! Per-frame feature extractor

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ear::{eye_aspect_ratio, EyeSelection};
use crate::{FeatureConfig, FeatureError, HeadPose, LandmarkSet};

/// Context the closure threshold depends on
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    /// Current vehicle speed (km/h)
    pub speed_kmh: f64,
    /// Latest low-light estimate
    pub low_light: bool,
}

/// Features extracted from one landmark set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameFeatures {
    pub left_ear: f64,
    pub right_ear: f64,
    pub effective_ear: f64,
    pub pose: HeadPose,
    /// Closure threshold applied to this frame
    pub threshold: f64,
    pub is_closed: bool,
}

/// Landmark feature extractor
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Change the base closure threshold; applies from the next frame
    pub fn set_base_threshold(&mut self, threshold: f64) {
        self.config.base_ear_threshold = threshold;
    }

    /// Closure threshold for the given context
    pub fn dynamic_threshold(&self, context: &FrameContext) -> f64 {
        let mut threshold = self.config.base_ear_threshold;
        if context.speed_kmh > self.config.high_speed_kmh {
            threshold += self.config.high_speed_boost;
        }
        if context.low_light {
            threshold -= self.config.low_light_relief;
        }
        threshold.max(self.config.threshold_floor)
    }

    /// Extract features from a landmark set
    ///
    /// Fails when the set is empty or lacks a required landmark; callers
    /// treat that as a frame without a face.
    pub fn extract(
        &self,
        landmarks: &LandmarkSet,
        context: &FrameContext,
    ) -> Result<FrameFeatures, FeatureError> {
        if landmarks.is_empty() {
            return Err(FeatureError::Empty);
        }
        let indices = &self.config.indices;
        if let Some(index) = indices.required().find(|&i| i >= landmarks.len()) {
            return Err(FeatureError::MissingLandmark {
                index,
                len: landmarks.len(),
            });
        }

        let pose = HeadPose::from_landmarks(landmarks, indices, self.config.yaw_epsilon)?;
        let left_ear = eye_aspect_ratio(landmarks, &indices.left_eye)?;
        let right_ear = eye_aspect_ratio(landmarks, &indices.right_eye)?;

        let selection = EyeSelection::for_yaw(pose.yaw_ratio, &self.config);
        let effective_ear = selection.apply(left_ear, right_ear);
        let threshold = self.dynamic_threshold(context);

        debug!(
            "EAR left={:.3} right={:.3} effective={:.3} ({:?}) threshold={:.3}",
            left_ear, right_ear, effective_ear, selection, threshold
        );

        Ok(FrameFeatures {
            left_ear,
            right_ear,
            effective_ear,
            pose,
            threshold,
            is_closed: effective_ear < threshold,
        })
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{FaceMeshIndices, Point2};
    use proptest::prelude::*;

    /// Build a full mesh-sized set with both eyes at the given openness
    pub(crate) fn face(left_open: f32, right_open: f32, nose_x: f32) -> LandmarkSet {
        let indices = FaceMeshIndices::default();
        let mut points = vec![Point2::new(0.5, 0.5); 468];

        let mut place_eye = |eye: [usize; 6], cx: f32, open: f32| {
            points[eye[0]] = Point2::new(cx - 0.05, 0.4);
            points[eye[1]] = Point2::new(cx - 0.02, 0.4 - open);
            points[eye[2]] = Point2::new(cx + 0.02, 0.4 - open);
            points[eye[3]] = Point2::new(cx + 0.05, 0.4);
            points[eye[4]] = Point2::new(cx + 0.02, 0.4 + open);
            points[eye[5]] = Point2::new(cx - 0.02, 0.4 + open);
        };
        place_eye(indices.left_eye, 0.4, left_open);
        place_eye(indices.right_eye, 0.6, right_open);

        points[indices.nose] = Point2::new(nose_x, 0.5);
        points[indices.left_cheek] = Point2::new(0.8, 0.5);
        points[indices.right_cheek] = Point2::new(0.2, 0.5);
        LandmarkSet::new(points, 0)
    }

    #[test]
    fn test_dynamic_threshold() {
        let extractor = FeatureExtractor::default();
        let base = FrameContext::default();
        assert!((extractor.dynamic_threshold(&base) - 0.20).abs() < 1e-9);

        let fast = FrameContext { speed_kmh: 90.0, low_light: false };
        assert!((extractor.dynamic_threshold(&fast) - 0.25).abs() < 1e-9);

        let dark = FrameContext { speed_kmh: 0.0, low_light: true };
        assert!((extractor.dynamic_threshold(&dark) - 0.17).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_floor() {
        let mut extractor = FeatureExtractor::default();
        extractor.set_base_threshold(0.10);
        let dark = FrameContext { speed_kmh: 0.0, low_light: true };
        assert_eq!(extractor.dynamic_threshold(&dark), 0.12);
    }

    #[test]
    fn test_open_eyes() {
        let extractor = FeatureExtractor::default();
        // EAR = (2 * 0.04) / (2 * 0.1) = 0.4
        let features = extractor
            .extract(&face(0.02, 0.02, 0.5), &FrameContext::default())
            .unwrap();
        assert!((features.effective_ear - 0.4).abs() < 1e-3);
        assert!(!features.is_closed);
    }

    #[test]
    fn test_both_eyes_closed() {
        let extractor = FeatureExtractor::default();
        let features = extractor
            .extract(&face(0.002, 0.003, 0.5), &FrameContext::default())
            .unwrap();
        assert!(features.is_closed);
    }

    #[test]
    fn test_single_closed_eye_is_open_when_frontal() {
        let extractor = FeatureExtractor::default();
        let features = extractor
            .extract(&face(0.002, 0.02, 0.5), &FrameContext::default())
            .unwrap();
        assert!(!features.is_closed);
        assert_eq!(features.effective_ear, features.right_ear);
    }

    #[test]
    fn test_turned_head_uses_visible_eye() {
        let extractor = FeatureExtractor::default();
        // Nose near the right cheek: yaw ratio ~ 0.5 / 0.1 = 5
        let features = extractor
            .extract(&face(0.02, 0.002, 0.3), &FrameContext::default())
            .unwrap();
        assert!(features.pose.yaw_ratio > 1.5);
        assert_eq!(features.effective_ear, features.right_ear);
        assert!(features.is_closed);
    }

    #[test]
    fn test_empty_set_rejected() {
        let extractor = FeatureExtractor::default();
        assert_eq!(
            extractor.extract(&LandmarkSet::default(), &FrameContext::default()),
            Err(FeatureError::Empty)
        );
    }

    #[test]
    fn test_short_set_rejected() {
        let extractor = FeatureExtractor::default();
        let set = LandmarkSet::new(vec![Point2::default(); 100], 0);
        assert!(matches!(
            extractor.extract(&set, &FrameContext::default()),
            Err(FeatureError::MissingLandmark { len: 100, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_threshold_never_below_floor(
            base in 0.01f64..0.5,
            speed in 0.0f64..200.0,
            low_light in any::<bool>(),
        ) {
            let mut extractor = FeatureExtractor::default();
            extractor.set_base_threshold(base);
            let threshold = extractor.dynamic_threshold(&FrameContext { speed_kmh: speed, low_light });
            prop_assert!(threshold >= extractor.config().threshold_floor);
        }

        #[test]
        fn prop_effective_ear_is_one_eye(left in 0.001f32..0.05, right in 0.001f32..0.05, nose in 0.25f32..0.75) {
            let extractor = FeatureExtractor::default();
            let features = extractor.extract(&face(left, right, nose), &FrameContext::default()).unwrap();
            prop_assert!(features.effective_ear == features.left_ear || features.effective_ear == features.right_ear);
        }
    }
}

//! Head pose from nose and cheek landmarks

use serde::{Deserialize, Serialize};

use crate::{FaceMeshIndices, FeatureError, LandmarkSet};

/// Coarse head pose derived from three landmarks
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    /// Nose-to-left-cheek over nose-to-right-cheek horizontal distance.
    /// 1.0 is frontal.
    pub yaw_ratio: f64,
    /// Magnitude of the turn, 0.0 (frontal) to 1.0 (profile)
    pub side_factor: f64,
    /// Nose height relative to the cheek midline; positive is looking down
    pub pitch: f64,
}

impl HeadPose {
    pub fn from_landmarks(
        landmarks: &LandmarkSet,
        indices: &FaceMeshIndices,
        yaw_epsilon: f64,
    ) -> Result<Self, FeatureError> {
        let nose = landmarks.get(indices.nose)?;
        let left_cheek = landmarks.get(indices.left_cheek)?;
        let right_cheek = landmarks.get(indices.right_cheek)?;

        let to_left = (nose.x as f64 - left_cheek.x as f64).abs();
        let to_right = (nose.x as f64 - right_cheek.x as f64).abs();
        let yaw_ratio = to_left / (to_right + yaw_epsilon);

        let cheek_y = (left_cheek.y as f64 + right_cheek.y as f64) / 2.0;

        Ok(Self {
            yaw_ratio,
            side_factor: (1.0 - yaw_ratio).abs().min(1.0),
            pitch: nose.y as f64 - cheek_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point2;

    fn pose_set(nose: Point2, left: Point2, right: Point2) -> (LandmarkSet, FaceMeshIndices) {
        let indices = FaceMeshIndices {
            nose: 0,
            left_cheek: 1,
            right_cheek: 2,
            ..Default::default()
        };
        (LandmarkSet::new(vec![nose, left, right], 0), indices)
    }

    #[test]
    fn test_frontal_pose() {
        let (set, indices) = pose_set(
            Point2::new(0.5, 0.5),
            Point2::new(0.7, 0.5),
            Point2::new(0.3, 0.5),
        );
        let pose = HeadPose::from_landmarks(&set, &indices, 0.001).unwrap();
        assert!((pose.yaw_ratio - 0.2 / 0.201).abs() < 1e-6);
        assert!(pose.side_factor < 0.01);
        assert!(pose.pitch.abs() < 1e-6);
    }

    #[test]
    fn test_coincident_nose_and_cheek() {
        let (set, indices) = pose_set(
            Point2::new(0.3, 0.6),
            Point2::new(0.7, 0.5),
            Point2::new(0.3, 0.5),
        );
        let pose = HeadPose::from_landmarks(&set, &indices, 0.001).unwrap();
        assert!(pose.yaw_ratio.is_finite());
        assert_eq!(pose.side_factor, 1.0);
        // Looking down
        assert!(pose.pitch > 0.0);
    }
}

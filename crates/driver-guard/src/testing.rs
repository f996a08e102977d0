//! Shared test fixtures

use landmark_features::{FaceMeshIndices, LandmarkSet, Point2};

/// Full 468-point frontal face with both eyes at the given openness
///
/// EAR comes out as `20 * open`: 0.02 is open, 0.002 is closed.
pub(crate) fn face(open: f32) -> LandmarkSet {
    stamped_face(open, 0)
}

pub(crate) fn stamped_face(open: f32, timestamp_ms: u64) -> LandmarkSet {
    let indices = FaceMeshIndices::default();
    let mut points = vec![Point2::new(0.5, 0.5); 468];
    for (eye, cx) in [(indices.left_eye, 0.4), (indices.right_eye, 0.6)] {
        points[eye[0]] = Point2::new(cx - 0.05, 0.4);
        points[eye[1]] = Point2::new(cx - 0.02, 0.4 - open);
        points[eye[2]] = Point2::new(cx + 0.02, 0.4 - open);
        points[eye[3]] = Point2::new(cx + 0.05, 0.4);
        points[eye[4]] = Point2::new(cx + 0.02, 0.4 + open);
        points[eye[5]] = Point2::new(cx - 0.02, 0.4 + open);
    }
    points[indices.nose] = Point2::new(0.5, 0.5);
    points[indices.left_cheek] = Point2::new(0.8, 0.5);
    points[indices.right_cheek] = Point2::new(0.2, 0.5);
    LandmarkSet::new(points, timestamp_ms)
}

//! Normalized face-mesh landmark types

use serde::{Deserialize, Serialize};

use crate::FeatureError;

/// A 2-D point in normalized [0, 1] image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x as f64 - other.x as f64).hypot(self.y as f64 - other.y as f64)
    }
}

impl From<[f32; 2]> for Point2 {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// Landmarks produced by the detector for a single frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Point2>,
    /// Capture timestamp of the source frame (milliseconds)
    timestamp_ms: u64,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2>, timestamp_ms: u64) -> Self {
        Self {
            points,
            timestamp_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Look up a landmark by mesh index
    pub fn get(&self, index: usize) -> Result<Point2, FeatureError> {
        self.points
            .get(index)
            .copied()
            .ok_or(FeatureError::MissingLandmark {
                index,
                len: self.points.len(),
            })
    }

    /// Flatten to `[x0, y0, x1, y1, ...]` for telemetry consumers
    pub fn flatten(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }
}

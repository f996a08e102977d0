//! Read-only snapshots published after every evaluation

use alerting::{FatigueEvent, WarningAction};
use fusion_engine::{Edge, Verdict};
use serde::{Deserialize, Serialize};

/// State of the vision signal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectorStatus {
    /// Frames are scheduled onto the attached detector
    #[default]
    Ready,
    /// Landmarks are pushed directly by the caller
    External,
    /// Detector failed to initialize; running on the remaining signals
    Unavailable { reason: String },
}

impl DetectorStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DetectorStatus::Unavailable { .. })
    }
}

/// Telemetry snapshot for UI and logging consumers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Telemetry {
    pub is_fatigue: bool,
    pub reason: String,
    pub ear: f64,
    pub perclos: f64,
    pub fps: u32,
    pub speed_kmh: f64,
    pub heart_rate_bpm: Option<f64>,
    pub vehicle_stable: bool,
    pub low_light: bool,
    /// Stalled detections given up on since the last reset
    pub abandoned_detections: u64,
    /// Last analyzed landmarks, flattened `[x0, y0, x1, y1, ...]`
    pub landmarks: Vec<f32>,
    /// Wall-clock publication time (milliseconds since epoch)
    pub timestamp_ms: u64,
    pub detector: DetectorStatus,
}

/// Verdict message for subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictUpdate {
    pub verdict: Verdict,
    pub reason: String,
    pub edge: Option<Edge>,
    pub warning: WarningAction,
    /// Present on the Nominal -> Fatigue transition
    pub event: Option<FatigueEvent>,
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

//! Fusion state

use closure_history::ClosureTimer;
use serde::{Deserialize, Serialize};

use crate::Verdict;

/// Vision features for one analyzed frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VisionFeatures {
    pub effective_ear: f64,
    /// Closure judged upstream with the frame's dynamic threshold
    pub is_closed: bool,
    pub is_nodding: bool,
    pub perclos: f64,
}

/// Latest value of every input signal plus the current verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionState {
    /// Vehicle speed (km/h)
    pub speed_kmh: f64,
    /// Occupant heart rate (bpm), `None` while unknown
    pub heart_rate_bpm: Option<f64>,
    pub ear: f64,
    pub perclos: f64,
    pub is_closed: bool,
    pub is_nodding: bool,
    pub vehicle_stable: bool,
    #[serde(skip)]
    pub closure: ClosureTimer,
    pub verdict: Verdict,
}

impl Default for FusionState {
    fn default() -> Self {
        Self {
            speed_kmh: 0.0,
            heart_rate_bpm: None,
            ear: 0.0,
            perclos: 0.0,
            is_closed: false,
            is_nodding: false,
            vehicle_stable: true,
            closure: ClosureTimer::default(),
            verdict: Verdict::nominal(),
        }
    }
}

impl FusionState {
    /// Continuous eye closure (seconds)
    pub fn closed_secs(&self) -> f64 {
        self.closure.closed_for().as_secs_f64()
    }
}

//! Fatigue verdict types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the engine judged the driver fatigued
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FatigueReason {
    /// Eyes closed longer than the effective duration
    MicroSleep { closed_secs: f64 },
    /// PERCLOS above the effective threshold
    Drowsiness { perclos: f64 },
    /// Restless head while the vehicle is stable
    Nodding,
    /// Very low heart rate with partial eye closure
    Physiological { heart_rate_bpm: f64 },
}

impl fmt::Display for FatigueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatigueReason::MicroSleep { closed_secs } => {
                write!(f, "Micro-sleep detected ({:.1}s)", closed_secs)
            }
            FatigueReason::Drowsiness { perclos } => {
                write!(f, "Drowsiness detected (PERCLOS: {:.2})", perclos)
            }
            FatigueReason::Nodding => write!(f, "Distracted/Nodding detected"),
            FatigueReason::Physiological { heart_rate_bpm } => {
                write!(f, "Physiological fatigue (HR: {})", *heart_rate_bpm as i64)
            }
        }
    }
}

/// Current fatigue verdict
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Verdict {
    pub is_fatigue: bool,
    pub reason: Option<FatigueReason>,
}

impl Verdict {
    pub fn nominal() -> Self {
        Self::default()
    }

    pub fn fatigue(reason: FatigueReason) -> Self {
        Self {
            is_fatigue: true,
            reason: Some(reason),
        }
    }

    /// Human-readable reason, empty when nominal
    pub fn reason_text(&self) -> String {
        self.reason.map(|r| r.to_string()).unwrap_or_default()
    }
}

/// Transition of the fatigue flag between evaluations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    /// Nominal -> Fatigue
    Rising,
    /// Fatigue -> Nominal
    Falling,
}

impl Edge {
    pub fn between(previous: bool, current: bool) -> Option<Self> {
        match (previous, current) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        }
    }
}

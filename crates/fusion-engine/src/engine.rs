//! Fusion engine implementation

use std::time::Instant;
use tracing::{debug, info};

use crate::{
    ContextFactors, Edge, EffectiveThresholds, FatigueReason, FusionConfig, FusionState, Verdict,
    VisionFeatures,
};

/// Result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    /// Set when the fatigue flag changed in this evaluation
    pub edge: Option<Edge>,
    pub factors: ContextFactors,
    pub thresholds: EffectiveThresholds,
    /// Closure judged against the fusion EAR threshold. Diagnostic only:
    /// history and micro-sleep timing use the upstream closure flag.
    pub ear_below_threshold: bool,
}

/// Fatigue fusion engine
///
/// Owns the session's `FusionState`. Every update mutates one signal and
/// re-evaluates the verdict from the whole state.
pub struct FusionEngine {
    config: FusionConfig,
    state: FusionState,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self {
            config,
            state: FusionState::default(),
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn state(&self) -> &FusionState {
        &self.state
    }

    pub fn verdict(&self) -> Verdict {
        self.state.verdict
    }

    /// Change the micro-sleep base duration; applies from the next evaluation
    pub fn set_base_duration(&mut self, secs: f64) {
        self.config.base_duration_secs = secs;
    }

    /// Apply the features of an analyzed frame observed at `now`
    pub fn update_vision(&mut self, vision: VisionFeatures, now: Instant) -> Evaluation {
        self.state.ear = vision.effective_ear;
        self.state.perclos = vision.perclos;
        self.state.is_closed = vision.is_closed;
        self.state.is_nodding = vision.is_nodding;
        self.state.closure.update(vision.is_closed, now);
        self.evaluate()
    }

    pub fn update_speed(&mut self, speed_kmh: f64) -> Evaluation {
        self.state.speed_kmh = speed_kmh;
        self.evaluate()
    }

    /// Heart rate in bpm; non-positive or non-finite means unknown
    pub fn update_heart_rate(&mut self, bpm: f64) -> Evaluation {
        self.state.heart_rate_bpm = (bpm.is_finite() && bpm > 0.0).then_some(bpm);
        self.evaluate()
    }

    pub fn update_stability(&mut self, vehicle_stable: bool) -> Evaluation {
        self.state.vehicle_stable = vehicle_stable;
        self.evaluate()
    }

    /// Back to the initial Nominal state
    pub fn reset(&mut self) {
        self.state = FusionState::default();
        info!("Fusion state reset");
    }

    fn evaluate(&mut self) -> Evaluation {
        let factors = ContextFactors::from_state(&self.state, &self.config);
        let thresholds = EffectiveThresholds::compute(&factors, &self.config);
        let ear_below_threshold = self.state.ear < thresholds.ear;
        if ear_below_threshold != self.state.is_closed {
            debug!(
                "Closure disagreement: upstream={} fusion={} (EAR {:.3} vs {:.3})",
                self.state.is_closed, ear_below_threshold, self.state.ear, thresholds.ear
            );
        }

        let verdict = match self.judge(&thresholds) {
            Some(reason) => Verdict::fatigue(reason),
            None => Verdict::nominal(),
        };

        let edge = Edge::between(self.state.verdict.is_fatigue, verdict.is_fatigue);
        match edge {
            Some(Edge::Rising) => info!("Fatigue: {}", verdict.reason_text()),
            Some(Edge::Falling) => info!("Fatigue cleared"),
            None => {}
        }
        self.state.verdict = verdict;

        Evaluation {
            verdict,
            edge,
            factors,
            thresholds,
            ear_below_threshold,
        }
    }

    /// First matching criterion wins
    fn judge(&self, thresholds: &EffectiveThresholds) -> Option<FatigueReason> {
        let state = &self.state;
        let closed_secs = state.closed_secs();

        if closed_secs > thresholds.duration_secs {
            return Some(FatigueReason::MicroSleep { closed_secs });
        }

        if state.perclos > thresholds.perclos {
            return Some(FatigueReason::Drowsiness {
                perclos: state.perclos,
            });
        }

        // Head motion on a bouncing vehicle is not trusted
        if state.is_nodding && state.vehicle_stable {
            return Some(FatigueReason::Nodding);
        }

        if let Some(bpm) = state.heart_rate_bpm {
            if bpm < self.config.physiological_bpm && state.perclos > self.config.physiological_perclos {
                return Some(FatigueReason::Physiological { heart_rate_bpm: bpm });
            }
        }

        None
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

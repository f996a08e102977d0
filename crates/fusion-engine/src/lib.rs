//! Fatigue Fusion Engine
//!
//! Correlates the latest value of every input signal:
//! - Vision (effective EAR, PERCLOS, closure, nodding)
//! - Vehicle speed
//! - Occupant heart rate
//! - Vehicle motion stability
//!
//! and re-evaluates a single fatigue verdict on every update, with
//! thresholds adjusted to the driving context.

mod config;
mod context;
mod engine;
mod state;
mod verdict;

pub use config::FusionConfig;
pub use context::{ContextFactors, EffectiveThresholds};
pub use engine::{Evaluation, FusionEngine};
pub use state::{FusionState, VisionFeatures};
pub use verdict::{Edge, FatigueReason, Verdict};

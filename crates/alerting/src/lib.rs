//! Alerting System
//!
//! Turns the stream of fatigue verdicts into warning actions and one-shot
//! fatigue events (on the rising edge) for the external logger.

mod edges;

pub use edges::{AlertContext, AlertOutcome, FatigueAlerts, FatigueEvent, WarningAction};

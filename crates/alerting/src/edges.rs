//! Fatigue edge tracking

use chrono::{DateTime, Utc};
use fusion_engine::{Edge, FatigueReason, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// What the warning actuator should do after a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningAction {
    /// Keep (or start) the spoken warning
    Warn,
    /// Silence any active warning
    Cancel,
}

/// Fatigue event handed to the external logger on a rising edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub reason: FatigueReason,
    pub speed_kmh: f64,
    pub ear: f64,
}

/// Signal values recorded alongside an event
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertContext {
    pub speed_kmh: f64,
    pub ear: f64,
}

/// Result of feeding one verdict
#[derive(Debug, Clone, PartialEq)]
pub struct AlertOutcome {
    pub action: WarningAction,
    pub edge: Option<Edge>,
    /// Present only on the Nominal -> Fatigue transition
    pub event: Option<FatigueEvent>,
}

/// Tracks the fatigue flag across verdicts
#[derive(Debug, Default)]
pub struct FatigueAlerts {
    active: bool,
    events_raised: u64,
}

impl FatigueAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_verdict(&mut self, verdict: &Verdict, context: AlertContext) -> AlertOutcome {
        let edge = Edge::between(self.active, verdict.is_fatigue);
        self.active = verdict.is_fatigue;

        let event = match (edge, verdict.reason) {
            (Some(Edge::Rising), Some(reason)) => {
                self.events_raised += 1;
                info!("Fatigue event #{}: {}", self.events_raised, reason);
                Some(FatigueEvent {
                    id: Uuid::new_v4(),
                    at: Utc::now(),
                    reason,
                    speed_kmh: context.speed_kmh,
                    ear: context.ear,
                })
            }
            (Some(Edge::Falling), _) => {
                debug!("Fatigue warning cleared");
                None
            }
            _ => None,
        };

        AlertOutcome {
            action: if verdict.is_fatigue {
                WarningAction::Warn
            } else {
                WarningAction::Cancel
            },
            edge,
            event,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Events raised since the last reset
    pub fn events_raised(&self) -> u64 {
        self.events_raised
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.events_raised = 0;
    }
}

//! Adaptive Frame Scheduler
//!
//! Decides which camera frames are submitted to the landmark detector:
//! - Speed-driven detection mode with operator override
//! - Frame skipping per mode
//! - At most one submission in flight, with stall recovery

mod fps;
mod scheduler;

pub use fps::FpsCounter;
pub use scheduler::{
    Admission, DetectionMode, FrameScheduler, SchedulerConfig, SchedulerState, Ticket,
};

use thiserror::Error;

/// Scheduler error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Skip factor for {0:?} must be at least 1")]
    ZeroSkipFactor(DetectionMode),

    #[error("Unknown detection mode code: {0}")]
    UnknownMode(u8),
}

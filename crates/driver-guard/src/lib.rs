//! Driver Guard
//!
//! Driver fatigue monitoring session. Camera frames (or externally detected
//! face landmarks), vehicle speed, heart rate and motion stability are fused
//! into a single fatigue verdict, published as telemetry and verdict updates.

mod config;
mod replay;
mod session;
mod source;
mod telemetry;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, LoggingConfig, PipelineConfig, SessionConfig, ENV_PREFIX};
pub use replay::{replay, ReplayEvent, ReplayStats};
pub use session::{Session, SessionError, SessionHandle, Tuning};
pub use source::{DetectorError, Frame, LandmarkSource};
pub use telemetry::{DetectorStatus, Telemetry, VerdictUpdate};

pub use alerting::{FatigueEvent, WarningAction};
pub use frame_scheduler::DetectionMode;
pub use fusion_engine::{Edge, FatigueReason, Verdict};
pub use landmark_features::{LandmarkSet, Point2};
pub use vehicle_signals::AccelSample;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging on stderr; stdout carries verdict output
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

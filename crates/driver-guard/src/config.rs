//! Pipeline configuration loading

use closure_history::HistoryConfig;
use frame_scheduler::{DetectionMode, SchedulerConfig, SchedulerError};
use fusion_engine::FusionConfig;
use landmark_features::{FeatureConfig, LightConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;
use vehicle_signals::StabilityConfig;

/// Environment variable prefix, e.g. `DRIVER_GUARD__FUSION__BASE_DURATION_SECS`
pub const ENV_PREFIX: &str = "DRIVER_GUARD";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid scheduler configuration: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Session runtime options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Operator-selected detection mode
    pub detection_mode: DetectionMode,
    /// Capacity of the signal command queue
    pub command_capacity: usize,
    /// Capacity of the verdict broadcast channel
    pub verdict_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detection_mode: DetectionMode::Balanced,
            command_capacity: 64,
            verdict_capacity: 32,
        }
    }
}

/// Logging options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub light: LightConfig,
    pub history: HistoryConfig,
    pub scheduler: SchedulerConfig,
    pub fusion: FusionConfig,
    pub stability: StabilityConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load defaults, then an optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;

        if self.history.closure_capacity == 0 || self.history.pitch_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history capacities must be positive".into(),
            ));
        }
        if self.session.command_capacity == 0 || self.session.verdict_capacity == 0 {
            return Err(ConfigError::Invalid(
                "session channel capacities must be positive".into(),
            ));
        }
        check_positive("features.base_ear_threshold", self.features.base_ear_threshold)?;
        check_positive("fusion.base_duration_secs", self.fusion.base_duration_secs)?;
        Ok(())
    }
}

pub(crate) fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serializes tests that read the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_validate() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.closure_capacity, 300);
        assert_eq!(config.scheduler.stall_timeout_ms, 2000);
        assert_eq!(config.fusion.base_duration_secs, 1.5);
    }

    #[test]
    fn test_load_partial_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let path = std::env::temp_dir().join(format!("driver-guard-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[fusion]\nbase_duration_secs = 2.0\n\n[session]\ndetection_mode = \"power_saver\""
        )
        .unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.fusion.base_duration_secs, 2.0);
        assert_eq!(config.fusion.base_perclos_threshold, 0.4);
        assert_eq!(config.session.detection_mode, DetectionMode::PowerSaver);
    }

    #[test]
    fn test_environment_overrides() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("DRIVER_GUARD__FUSION__BASE_DURATION_SECS", "2.5");
        std::env::set_var("DRIVER_GUARD__SESSION__DETECTION_MODE", "high_performance");
        let loaded = PipelineConfig::load(None);
        std::env::remove_var("DRIVER_GUARD__FUSION__BASE_DURATION_SECS");
        std::env::remove_var("DRIVER_GUARD__SESSION__DETECTION_MODE");

        let config = loaded.unwrap();
        assert_eq!(config.fusion.base_duration_secs, 2.5);
        assert_eq!(config.session.detection_mode, DetectionMode::HighPerformance);
        assert_eq!(config.fusion.base_perclos_threshold, 0.4);
    }

    #[test]
    fn test_rejects_zero_skip() {
        let mut config = PipelineConfig::default();
        config.scheduler.power_saver_skip = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Scheduler(_))));
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let mut config = PipelineConfig::default();
        config.features.base_ear_threshold = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}

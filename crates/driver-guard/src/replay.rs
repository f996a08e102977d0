//! NDJSON signal replay
//!
//! Each input line is one event, e.g.
//! `{"type":"speed","kmh":72.0}` or `{"type":"pause","ms":33}`.
//! Blank lines and lines starting with `#` are ignored.

use landmark_features::{LandmarkSet, Point2};
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};
use vehicle_signals::AccelSample;

use crate::session::{SessionError, SessionHandle, Tuning};

/// One recorded signal event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Speed { kmh: f64 },
    GpsSpeed { mps: f64 },
    HeartRate { bpm: f64 },
    Stability { stable: bool },
    Accel { x: f32, y: f32, z: f32 },
    Landmarks {
        points: Vec<[f32; 2]>,
        #[serde(default)]
        timestamp_ms: u64,
    },
    Tuning(Tuning),
    /// Wall-clock gap; landmark sets with a capture stamp do not need one
    Pause { ms: u64 },
    Reset,
}

/// Replay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Feed an NDJSON event stream into a session
///
/// Unparseable lines and rejected signal values are logged and skipped.
/// Returns once every applied event has been processed by the session.
pub async fn replay<R>(reader: R, handle: &SessionHandle) -> Result<ReplayStats, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReplayStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: ReplayEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Line {}: skipping malformed event: {}", line_no, e);
                stats.skipped += 1;
                continue;
            }
        };

        match apply(event, handle).await {
            Ok(()) => stats.applied += 1,
            Err(SessionError::Closed) => return Err(SessionError::Closed),
            Err(e) => {
                warn!("Line {}: event rejected: {}", line_no, e);
                stats.skipped += 1;
            }
        }
    }

    handle.flush().await?;
    debug!("Replay done: {:?}", stats);
    Ok(stats)
}

async fn apply(event: ReplayEvent, handle: &SessionHandle) -> Result<(), SessionError> {
    match event {
        ReplayEvent::Speed { kmh } => handle.update_speed(kmh).await,
        ReplayEvent::GpsSpeed { mps } => handle.update_gps_speed(mps).await,
        ReplayEvent::HeartRate { bpm } => handle.update_heart_rate(bpm).await,
        ReplayEvent::Stability { stable } => handle.update_stability(stable).await,
        ReplayEvent::Accel { x, y, z } => handle.push_accel(AccelSample::new(x, y, z)).await,
        ReplayEvent::Landmarks {
            points,
            timestamp_ms,
        } => {
            let points = points.into_iter().map(Point2::from).collect();
            handle
                .push_landmarks(LandmarkSet::new(points, timestamp_ms))
                .await
        }
        ReplayEvent::Tuning(tuning) => handle.update_tuning(tuning).await,
        ReplayEvent::Pause { ms } => {
            // Commands sent so far must be evaluated before time moves on
            handle.flush().await?;
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        }
        ReplayEvent::Reset => handle.reset().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stamped_face;
    use crate::{PipelineConfig, Session};
    use frame_scheduler::DetectionMode;

    #[test]
    fn test_parse_events() {
        let event: ReplayEvent = serde_json::from_str(r#"{"type":"gps_speed","mps":20.0}"#).unwrap();
        assert_eq!(event, ReplayEvent::GpsSpeed { mps: 20.0 });

        let event: ReplayEvent =
            serde_json::from_str(r#"{"type":"tuning","mode":"power_saver"}"#).unwrap();
        assert_eq!(
            event,
            ReplayEvent::Tuning(Tuning {
                mode: Some(DetectionMode::PowerSaver),
                ..Default::default()
            })
        );

        let event: ReplayEvent =
            serde_json::from_str(r#"{"type":"landmarks","points":[[0.1,0.2]]}"#).unwrap();
        assert!(matches!(event, ReplayEvent::Landmarks { timestamp_ms: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_applies_signals() {
        let handle = Session::spawn_external(PipelineConfig::default()).unwrap();
        let input = br#"
# highway drive
{"type":"gps_speed","mps":25.0}
{"type":"heart_rate","bpm":45}
{"type":"pause","ms":100}
{"type":"stability","stable":false}
"#;

        let stats = replay(&input[..], &handle).await.unwrap();
        assert_eq!(stats, ReplayStats { applied: 4, skipped: 0 });

        let telemetry = handle.snapshot();
        assert!((telemetry.speed_kmh - 90.0).abs() < 1e-9);
        assert_eq!(telemetry.heart_rate_bpm, Some(45.0));
        assert!(!telemetry.vehicle_stable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_times_closure_from_capture_stamps() {
        let handle = Session::spawn_external(PipelineConfig::default()).unwrap();

        let mut input = String::from("{\"type\":\"speed\",\"kmh\":50}\n");
        for ts in [0u64, 1000, 2000, 3000] {
            let points: Vec<[f32; 2]> = stamped_face(0.002, 0)
                .points()
                .iter()
                .map(|p| [p.x, p.y])
                .collect();
            let line = serde_json::json!({ "type": "landmarks", "points": points, "timestamp_ms": ts });
            input.push_str(&line.to_string());
            input.push('\n');
        }

        let stats = replay(input.as_bytes(), &handle).await.unwrap();
        assert_eq!(stats, ReplayStats { applied: 5, skipped: 0 });

        let telemetry = handle.snapshot();
        assert!(telemetry.is_fatigue);
        assert!(telemetry.reason.starts_with("Micro-sleep"), "{}", telemetry.reason);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_skips_bad_lines() {
        let handle = Session::spawn_external(PipelineConfig::default()).unwrap();
        let input = br#"{"type":"speed","kmh":-5}
not json
{"type":"warp_drive"}
{"type":"tuning","duration_secs":0}
{"type":"speed","kmh":30}
"#;

        let stats = replay(&input[..], &handle).await.unwrap();
        assert_eq!(stats, ReplayStats { applied: 1, skipped: 4 });
        assert_eq!(handle.snapshot().speed_kmh, 30.0);
    }
}

//! Monitoring session
//!
//! One actor task owns every piece of mutable pipeline state. Signal sources
//! talk to it through a `SessionHandle`, so each update is evaluated in
//! isolation and a reset can never interleave with an evaluation.

use alerting::{AlertContext, FatigueAlerts, WarningAction};
use closure_history::HistoryTracker;
use frame_scheduler::{
    Admission, DetectionMode, FpsCounter, FrameScheduler, SchedulerError, Ticket,
};
use fusion_engine::{Edge, Evaluation, FusionEngine, Verdict, VisionFeatures};
use landmark_features::{FeatureExtractor, FrameContext, LandmarkSet, LowLightEstimator};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use vehicle_signals::{AccelSample, SignalError, StabilityEstimator};

use crate::config::{check_positive, ConfigError, PipelineConfig};
use crate::source::{DetectorError, Frame, LandmarkSource, NoDetector};
use crate::telemetry::{now_ms, DetectorStatus, Telemetry, VerdictUpdate};

/// Detection results waiting for the actor
const DETECTION_QUEUE: usize = 4;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session has shut down")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Rejected signal: {0}")]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime tunables; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Base EAR threshold for per-frame closure
    pub ear_threshold: Option<f64>,
    /// Base micro-sleep duration (seconds)
    pub duration_secs: Option<f64>,
    pub mode: Option<DetectionMode>,
}

impl Tuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ear) = self.ear_threshold {
            check_positive("ear_threshold", ear)?;
        }
        if let Some(secs) = self.duration_secs {
            check_positive("duration_secs", secs)?;
        }
        Ok(())
    }
}

enum Command {
    Frame(Frame),
    Landmarks(LandmarkSet),
    Speed(f64),
    HeartRate(f64),
    Stability(bool),
    Accel(AccelSample),
    Tuning(Tuning),
    Reset,
    Flush(oneshot::Sender<()>),
}

struct Detection {
    ticket: Ticket,
    result: Result<LandmarkSet, DetectorError>,
}

/// Session constructor
pub struct Session;

impl Session {
    /// Start a session on the current tokio runtime
    ///
    /// A detector that failed to initialize does not fail the session: it
    /// runs without vision and reports `DetectorStatus::Unavailable`.
    pub fn spawn<D: LandmarkSource>(
        config: PipelineConfig,
        detector: Result<D, DetectorError>,
    ) -> Result<SessionHandle, SessionError> {
        match detector {
            Ok(detector) => start(config, Some(Arc::new(detector)), DetectorStatus::Ready),
            Err(e) => {
                error!("Landmark detector unavailable, running without vision: {}", e);
                start::<D>(
                    config,
                    None,
                    DetectorStatus::Unavailable {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Start a session whose landmarks are pushed with `push_landmarks`
    pub fn spawn_external(config: PipelineConfig) -> Result<SessionHandle, SessionError> {
        start::<NoDetector>(config, None, DetectorStatus::External)
    }
}

fn start<D: LandmarkSource>(
    config: PipelineConfig,
    detector: Option<Arc<D>>,
    status: DetectorStatus,
) -> Result<SessionHandle, SessionError> {
    config.validate()?;
    let scheduler = FrameScheduler::new(config.scheduler.clone(), config.session.detection_mode)?;

    let (command_tx, command_rx) = mpsc::channel(config.session.command_capacity);
    let (detection_tx, detection_rx) = mpsc::channel(DETECTION_QUEUE);
    let telemetry = initial_telemetry(status);
    let (telemetry_tx, telemetry_rx) = watch::channel(telemetry.clone());
    let (verdict_tx, _) = broadcast::channel(config.session.verdict_capacity);

    let actor = SessionActor {
        detector,
        extractor: FeatureExtractor::new(config.features),
        tracker: HistoryTracker::new(config.history),
        scheduler,
        fusion: FusionEngine::new(config.fusion),
        light: LowLightEstimator::new(config.light),
        stability: StabilityEstimator::new(config.stability),
        fps: FpsCounter::new(),
        capture_clock: CaptureClock::default(),
        alerts: FatigueAlerts::new(),
        telemetry,
        telemetry_tx,
        verdict_tx: verdict_tx.clone(),
        detection_tx,
    };
    tokio::spawn(actor.run(command_rx, detection_rx));

    Ok(SessionHandle {
        commands: command_tx,
        verdicts: verdict_tx,
        telemetry: telemetry_rx,
    })
}

fn initial_telemetry(detector: DetectorStatus) -> Telemetry {
    Telemetry {
        vehicle_stable: true,
        timestamp_ms: now_ms(),
        detector,
        ..Default::default()
    }
}

/// Session clock; follows tokio's clock so paused-time tests control it
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Maps landmark capture timestamps onto the session clock
///
/// The first stamped set anchors the mapping; later sets land at the anchor
/// plus their capture offset, so recorded frames keep their real spacing no
/// matter how fast they arrive. Sets stamped 0 carry no capture time and use
/// the arrival time instead.
#[derive(Debug, Default)]
struct CaptureClock {
    anchor: Option<(u64, Instant)>,
}

impl CaptureClock {
    fn instant(&mut self, timestamp_ms: u64, now: Instant) -> Instant {
        if timestamp_ms == 0 {
            return now;
        }
        match self.anchor {
            Some((base_ms, base)) if timestamp_ms >= base_ms => {
                base + Duration::from_millis(timestamp_ms - base_ms)
            }
            _ => {
                // First stamp, or the source restarted its clock
                self.anchor = Some((timestamp_ms, now));
                now
            }
        }
    }

    fn reset(&mut self) {
        self.anchor = None;
    }
}

/// Cloneable handle feeding signals into a session
///
/// The session stops once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    verdicts: broadcast::Sender<VerdictUpdate>,
    telemetry: watch::Receiver<Telemetry>,
}

impl SessionHandle {
    /// Offer a camera frame without waiting
    ///
    /// Returns `false` when the frame was dropped because the session is
    /// backlogged.
    pub fn offer_frame(&self, frame: Frame) -> Result<bool, SessionError> {
        match self.commands.try_send(Command::Frame(frame)) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Session backlogged, dropping frame");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SessionError::Closed),
        }
    }

    /// Push landmarks that were detected outside the session
    pub async fn push_landmarks(&self, landmarks: LandmarkSet) -> Result<(), SessionError> {
        self.send(Command::Landmarks(landmarks)).await
    }

    /// Vehicle speed in km/h
    pub async fn update_speed(&self, kmh: f64) -> Result<(), SessionError> {
        let kmh = vehicle_signals::speed_kmh(kmh)?;
        self.send(Command::Speed(kmh)).await
    }

    /// GPS speed in m/s
    pub async fn update_gps_speed(&self, mps: f64) -> Result<(), SessionError> {
        let kmh = vehicle_signals::speed_kmh_from_mps(mps)?;
        self.send(Command::Speed(kmh)).await
    }

    /// Heart rate in bpm; 0 marks it unknown
    pub async fn update_heart_rate(&self, bpm: f64) -> Result<(), SessionError> {
        let bpm = vehicle_signals::heart_rate_bpm(bpm)?;
        self.send(Command::HeartRate(bpm)).await
    }

    pub async fn update_stability(&self, vehicle_stable: bool) -> Result<(), SessionError> {
        self.send(Command::Stability(vehicle_stable)).await
    }

    /// Raw accelerometer sample; stability changes are derived in-session
    pub async fn push_accel(&self, sample: AccelSample) -> Result<(), SessionError> {
        self.send(Command::Accel(sample)).await
    }

    pub async fn update_tuning(&self, tuning: Tuning) -> Result<(), SessionError> {
        tuning.validate()?;
        self.send(Command::Tuning(tuning)).await
    }

    /// Clear all history and return to Nominal
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.send(Command::Reset).await
    }

    /// Wait until every command sent before this call has been applied
    pub async fn flush(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Subscribe to verdict updates; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<VerdictUpdate> {
        self.verdicts.subscribe()
    }

    pub fn telemetry(&self) -> watch::Receiver<Telemetry> {
        self.telemetry.clone()
    }

    /// Latest published telemetry
    pub fn snapshot(&self) -> Telemetry {
        self.telemetry.borrow().clone()
    }

    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

struct SessionActor<D> {
    detector: Option<Arc<D>>,
    extractor: FeatureExtractor,
    tracker: HistoryTracker,
    scheduler: FrameScheduler,
    fusion: FusionEngine,
    light: LowLightEstimator,
    stability: StabilityEstimator,
    fps: FpsCounter,
    capture_clock: CaptureClock,
    alerts: FatigueAlerts,
    telemetry: Telemetry,
    telemetry_tx: watch::Sender<Telemetry>,
    verdict_tx: broadcast::Sender<VerdictUpdate>,
    detection_tx: mpsc::Sender<Detection>,
}

impl<D: LandmarkSource> SessionActor<D> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut detections: mpsc::Receiver<Detection>,
    ) {
        info!("Monitoring session started ({:?})", self.telemetry.detector);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(detection) = detections.recv() => self.on_detection(detection),
            }
        }

        info!("Monitoring session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Frame(frame) => self.on_frame(frame),
            Command::Landmarks(landmarks) => {
                let now = now();
                self.telemetry.fps = self.fps.tick(now);
                self.on_landmarks(&landmarks, now);
            }
            Command::Speed(kmh) => {
                self.scheduler.set_speed(kmh);
                let evaluation = self.fusion.update_speed(kmh);
                self.publish(evaluation, None);
            }
            Command::HeartRate(bpm) => {
                let evaluation = self.fusion.update_heart_rate(bpm);
                self.publish(evaluation, None);
            }
            Command::Stability(stable) => {
                let evaluation = self.fusion.update_stability(stable);
                self.publish(evaluation, None);
            }
            Command::Accel(sample) => {
                if let Some(stable) = self.stability.observe(sample) {
                    let evaluation = self.fusion.update_stability(stable);
                    self.publish(evaluation, None);
                }
            }
            Command::Tuning(tuning) => self.apply_tuning(tuning),
            Command::Reset => self.reset(),
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    fn on_frame(&mut self, frame: Frame) {
        let Some(detector) = self.detector.clone() else {
            return;
        };

        let recoveries = self.scheduler.recoveries();
        let Admission::Admitted(ticket) = self.scheduler.offer(now()) else {
            return;
        };
        if self.scheduler.recoveries() > recoveries {
            // The stalled task cannot be cancelled; it stays parked with its frame
            self.telemetry.abandoned_detections = self.scheduler.recoveries();
            warn!(
                "{} stalled detection(s) abandoned since last reset",
                self.telemetry.abandoned_detections
            );
        }
        self.light.observe(ticket.frame_index(), &frame.image);

        let results = self.detection_tx.clone();
        tokio::spawn(async move {
            let result = detector.detect(frame).await;
            // Session gone: nothing left to report to
            let _ = results.send(Detection { ticket, result }).await;
        });
    }

    fn on_detection(&mut self, detection: Detection) {
        if !self.scheduler.complete(detection.ticket) {
            debug!(
                "Discarding result of abandoned frame {}",
                detection.ticket.frame_index()
            );
            return;
        }

        let now = now();
        self.telemetry.fps = self.fps.tick(now);
        match detection.result {
            Ok(landmarks) => self.on_landmarks(&landmarks, now),
            Err(e) => warn!("Landmark detection failed: {}", e),
        }
    }

    fn on_landmarks(&mut self, landmarks: &LandmarkSet, now: Instant) {
        let context = FrameContext {
            speed_kmh: self.fusion.state().speed_kmh,
            low_light: self.light.is_low_light(),
        };
        let features = match self.extractor.extract(landmarks, &context) {
            Ok(features) => features,
            Err(e) => {
                debug!("No usable face in frame: {}", e);
                return;
            }
        };

        self.tracker.push_pitch(features.pose.pitch);
        let is_nodding = self.tracker.is_nodding();
        self.tracker.push_closure(features.is_closed);

        let vision = VisionFeatures {
            effective_ear: features.effective_ear,
            is_closed: features.is_closed,
            is_nodding,
            perclos: self.tracker.perclos(),
        };
        let captured_at = self.capture_clock.instant(landmarks.timestamp_ms(), now);
        let evaluation = self.fusion.update_vision(vision, captured_at);
        self.publish(evaluation, Some(landmarks));
    }

    fn apply_tuning(&mut self, tuning: Tuning) {
        if let Some(ear) = tuning.ear_threshold {
            self.extractor.set_base_threshold(ear);
        }
        if let Some(secs) = tuning.duration_secs {
            self.fusion.set_base_duration(secs);
        }
        if let Some(mode) = tuning.mode {
            self.scheduler.set_operator_mode(mode);
        }
        info!(
            "Tuning updated - EAR: {:.3}, duration: {:.2}s",
            self.extractor.config().base_ear_threshold,
            self.fusion.config().base_duration_secs
        );
    }

    fn reset(&mut self) {
        let was_fatigued = self.alerts.is_active();
        self.tracker.reset();
        self.scheduler.reset();
        self.fusion.reset();
        self.light.reset();
        self.stability.reset();
        self.fps.reset();
        self.capture_clock.reset();
        self.alerts.reset();

        self.telemetry = initial_telemetry(self.telemetry.detector.clone());
        self.telemetry_tx.send_replace(self.telemetry.clone());

        // Subscribers must see the warning drop with the verdict
        let _ = self.verdict_tx.send(VerdictUpdate {
            verdict: Verdict::nominal(),
            reason: String::new(),
            edge: was_fatigued.then_some(Edge::Falling),
            warning: WarningAction::Cancel,
            event: None,
        });
        info!("Monitoring session reset");
    }

    fn publish(&mut self, evaluation: Evaluation, landmarks: Option<&LandmarkSet>) {
        let state = self.fusion.state();
        let outcome = self.alerts.on_verdict(
            &evaluation.verdict,
            AlertContext {
                speed_kmh: state.speed_kmh,
                ear: state.ear,
            },
        );
        let reason = evaluation.verdict.reason_text();

        if let Some(landmarks) = landmarks {
            self.telemetry.landmarks = landmarks.flatten();
        }
        self.telemetry.is_fatigue = evaluation.verdict.is_fatigue;
        self.telemetry.reason = reason.clone();
        self.telemetry.ear = state.ear;
        self.telemetry.perclos = state.perclos;
        self.telemetry.speed_kmh = state.speed_kmh;
        self.telemetry.heart_rate_bpm = state.heart_rate_bpm;
        self.telemetry.vehicle_stable = state.vehicle_stable;
        self.telemetry.low_light = self.light.is_low_light();
        self.telemetry.timestamp_ms = now_ms();
        self.telemetry_tx.send_replace(self.telemetry.clone());

        // No subscribers is fine
        let _ = self.verdict_tx.send(VerdictUpdate {
            verdict: evaluation.verdict,
            reason,
            edge: evaluation.edge,
            warning: outcome.action,
            event: outcome.event,
        });
    }
}

//! Frame Scheduler Implementation

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::SchedulerError;

/// Detection mode, trading latency for CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    PowerSaver,
    #[default]
    Balanced,
    HighPerformance,
}

impl TryFrom<u8> for DetectionMode {
    type Error = SchedulerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DetectionMode::PowerSaver),
            1 => Ok(DetectionMode::Balanced),
            2 => Ok(DetectionMode::HighPerformance),
            other => Err(SchedulerError::UnknownMode(other)),
        }
    }
}

/// Configuration for the frame scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Above this speed the scheduler forces high performance (km/h)
    pub high_speed_kmh: f64,
    /// Below this speed the scheduler forces power saving (km/h)
    pub low_speed_kmh: f64,
    /// Submit 1 of every n frames in power-saver mode
    pub power_saver_skip: u64,
    /// Submit 1 of every n frames in balanced mode
    pub balanced_skip: u64,
    /// Submit 1 of every n frames in high-performance mode
    pub high_performance_skip: u64,
    /// Age after which an unanswered submission is abandoned (ms)
    pub stall_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            high_speed_kmh: 80.0,
            low_speed_kmh: 5.0,
            power_saver_skip: 15,
            balanced_skip: 2,
            high_performance_skip: 1,
            stall_timeout_ms: 2000,
        }
    }
}

impl SchedulerConfig {
    pub fn skip_factor(&self, mode: DetectionMode) -> u64 {
        match mode {
            DetectionMode::PowerSaver => self.power_saver_skip,
            DetectionMode::Balanced => self.balanced_skip,
            DetectionMode::HighPerformance => self.high_performance_skip,
        }
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        for mode in [
            DetectionMode::PowerSaver,
            DetectionMode::Balanced,
            DetectionMode::HighPerformance,
        ] {
            if self.skip_factor(mode) == 0 {
                return Err(SchedulerError::ZeroSkipFactor(mode));
            }
        }
        Ok(())
    }
}

/// Handle for one admitted frame
///
/// Completing a ticket releases the in-flight guard; tickets from before a
/// stall recovery or reset no longer match and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    frame_index: u64,
}

impl Ticket {
    /// Frame counter value at admission
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// Outcome of offering a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Submit this frame to the detector
    Admitted(Ticket),
    /// Not a sampled frame for the current mode
    Skipped,
    /// A submission is still in flight
    Busy,
}

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerState {
    pub frame_counter: u64,
    pub last_submit: Option<Instant>,
    pub in_flight: bool,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: Ticket,
    submitted_at: Instant,
}

/// Frame scheduler for the landmark detector
pub struct FrameScheduler {
    config: SchedulerConfig,
    operator_mode: DetectionMode,
    speed_kmh: f64,
    frame_counter: u64,
    /// Bumped whenever outstanding tickets must be invalidated
    generation: u64,
    in_flight: Option<InFlight>,
    last_submit: Option<Instant>,
    recoveries: u64,
}

impl FrameScheduler {
    pub fn new(config: SchedulerConfig, operator_mode: DetectionMode) -> Result<Self, SchedulerError> {
        config.validate()?;
        info!("Frame scheduler created in {:?} mode", operator_mode);
        Ok(Self {
            config,
            operator_mode,
            speed_kmh: 0.0,
            frame_counter: 0,
            generation: 0,
            in_flight: None,
            last_submit: None,
            recoveries: 0,
        })
    }

    pub fn set_operator_mode(&mut self, mode: DetectionMode) {
        if mode != self.operator_mode {
            info!("Detection mode changed: {:?} -> {:?}", self.operator_mode, mode);
        }
        self.operator_mode = mode;
    }

    pub fn set_speed(&mut self, speed_kmh: f64) {
        self.speed_kmh = speed_kmh;
    }

    /// Mode in effect: speed overrides the operator's choice
    pub fn effective_mode(&self) -> DetectionMode {
        if self.speed_kmh > self.config.high_speed_kmh {
            DetectionMode::HighPerformance
        } else if self.speed_kmh < self.config.low_speed_kmh {
            DetectionMode::PowerSaver
        } else {
            self.operator_mode
        }
    }

    /// Offer an incoming frame
    pub fn offer(&mut self, now: Instant) -> Admission {
        self.frame_counter += 1;

        let skip = self.config.skip_factor(self.effective_mode());
        if self.frame_counter % skip != 0 {
            return Admission::Skipped;
        }

        if let Some(in_flight) = self.in_flight {
            let age = now.saturating_duration_since(in_flight.submitted_at);
            if age > self.config.stall_timeout() {
                warn!(
                    "Detector stalled on frame {} for {}ms, forcing release",
                    in_flight.ticket.frame_index,
                    age.as_millis()
                );
                self.release_stalled();
            } else {
                debug!("Dropping frame {}: detection in flight", self.frame_counter);
                return Admission::Busy;
            }
        }

        let ticket = Ticket {
            generation: self.generation,
            frame_index: self.frame_counter,
        };
        self.in_flight = Some(InFlight {
            ticket,
            submitted_at: now,
        });
        self.last_submit = Some(now);
        Admission::Admitted(ticket)
    }

    /// Release the guard for a finished detection (success or error)
    ///
    /// Returns `false` for a ticket that is no longer current; its result
    /// must be discarded.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        match self.in_flight {
            Some(current) if current.ticket == ticket => {
                self.in_flight = None;
                true
            }
            _ => {
                debug!("Ignoring stale completion for frame {}", ticket.frame_index);
                false
            }
        }
    }

    fn release_stalled(&mut self) {
        self.in_flight = None;
        self.generation += 1;
        self.recoveries += 1;
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            frame_counter: self.frame_counter,
            last_submit: self.last_submit,
            in_flight: self.in_flight.is_some(),
        }
    }

    /// Number of stall recoveries since the last reset
    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }

    /// Clear counters and abandon any in-flight submission
    pub fn reset(&mut self) {
        self.frame_counter = 0;
        self.in_flight = None;
        self.last_submit = None;
        self.recoveries = 0;
        self.speed_kmh = 0.0;
        self.generation += 1;
        debug!("Frame scheduler reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(mode: DetectionMode) -> FrameScheduler {
        FrameScheduler::new(SchedulerConfig::default(), mode).unwrap()
    }

    #[test]
    fn test_mode_from_speed() {
        let mut s = scheduler(DetectionMode::Balanced);
        s.set_speed(90.0);
        assert_eq!(s.effective_mode(), DetectionMode::HighPerformance);
        s.set_speed(2.0);
        assert_eq!(s.effective_mode(), DetectionMode::PowerSaver);
        s.set_speed(50.0);
        assert_eq!(s.effective_mode(), DetectionMode::Balanced);
        s.set_operator_mode(DetectionMode::HighPerformance);
        assert_eq!(s.effective_mode(), DetectionMode::HighPerformance);
    }

    #[test]
    fn test_power_saver_admits_every_fifteenth() {
        let mut s = scheduler(DetectionMode::PowerSaver);
        s.set_speed(50.0);
        let now = Instant::now();

        let mut admitted = Vec::new();
        for _ in 0..30 {
            if let Admission::Admitted(ticket) = s.offer(now) {
                admitted.push(ticket.frame_index());
                assert!(s.complete(ticket));
            }
        }
        assert_eq!(admitted, vec![15, 30]);
    }

    #[test]
    fn test_busy_until_complete() {
        let mut s = scheduler(DetectionMode::HighPerformance);
        s.set_speed(50.0);
        let now = Instant::now();

        let Admission::Admitted(ticket) = s.offer(now) else {
            panic!("first frame should be admitted");
        };
        assert_eq!(s.offer(now + Duration::from_millis(100)), Admission::Busy);
        assert!(s.complete(ticket));
        assert!(matches!(
            s.offer(now + Duration::from_millis(200)),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_stall_recovery() {
        let mut s = scheduler(DetectionMode::HighPerformance);
        s.set_speed(50.0);
        let start = Instant::now();

        let Admission::Admitted(stuck) = s.offer(start) else {
            panic!("first frame should be admitted");
        };
        assert_eq!(s.offer(start + Duration::from_millis(2000)), Admission::Busy);

        let Admission::Admitted(fresh) = s.offer(start + Duration::from_millis(2001)) else {
            panic!("stalled guard should be released");
        };
        assert_eq!(s.recoveries(), 1);

        // The late result of the stuck frame must not release the new one
        assert!(!s.complete(stuck));
        assert!(s.state().in_flight);
        assert!(s.complete(fresh));
        // Released exactly once
        assert!(!s.complete(fresh));
    }

    #[test]
    fn test_reset_invalidates_tickets() {
        let mut s = scheduler(DetectionMode::HighPerformance);
        s.set_speed(50.0);
        let Admission::Admitted(ticket) = s.offer(Instant::now()) else {
            panic!("first frame should be admitted");
        };
        s.reset();
        assert!(!s.complete(ticket));
    }

    #[test]
    fn test_reset_idempotent() {
        let mut s = scheduler(DetectionMode::Balanced);
        let now = Instant::now();
        for _ in 0..40 {
            s.offer(now);
        }
        s.reset();
        let once = s.state();
        s.reset();
        assert_eq!(s.state(), once);
        assert_eq!(
            once,
            SchedulerState {
                frame_counter: 0,
                last_submit: None,
                in_flight: false,
            }
        );
    }

    #[test]
    fn test_zero_skip_rejected() {
        let config = SchedulerConfig {
            balanced_skip: 0,
            ..Default::default()
        };
        assert_eq!(
            FrameScheduler::new(config, DetectionMode::Balanced).err(),
            Some(SchedulerError::ZeroSkipFactor(DetectionMode::Balanced))
        );
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(DetectionMode::try_from(0), Ok(DetectionMode::PowerSaver));
        assert_eq!(DetectionMode::try_from(2), Ok(DetectionMode::HighPerformance));
        assert_eq!(DetectionMode::try_from(7), Err(SchedulerError::UnknownMode(7)));
    }
}

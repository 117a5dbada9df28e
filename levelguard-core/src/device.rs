//! Wake-Cycle Orchestration
//!
//! ## Overview
//!
//! [`Device`] owns the pipeline components and the board collaborators and
//! runs one wake cycle per [`Device::run_cycle`] call:
//!
//! ```text
//! load retained ─▶ [calibrate] ─▶ sample ─▶ push history ─▶ publish ─▶ plan ─▶ save
//!                  every n-th                               health,
//!                  cycle or when                            then readings
//!                  uncalibrated                             oldest first
//! ```
//!
//! ## Failure Handling
//!
//! Only configuration errors stop the device, and only in [`Device::new`].
//! Inside a cycle:
//!
//! - a rejected calibration keeps the previous estimate
//! - a failed measurement is still buffered and published as a gap
//! - the first failed publish ends publishing; unsent readings stay buffered
//! - a retained store that cannot be written is logged and ignored
//!
//! So `run_cycle` always returns a [`CycleReport`] carrying a valid
//! [`SleepPlan`].
//!
//! ```rust
//! use levelguard_core::device::{Collaborators, Device};
//! use levelguard_core::errors::{SensorError, UplinkError};
//! use levelguard_core::pulse::RawPulseSample;
//! use levelguard_core::retained::RtcRetainedStore;
//! use levelguard_core::telemetry::{Message, Topic};
//! use levelguard_core::time::FixedTime;
//! use levelguard_core::traits::*;
//! use levelguard_core::LevelGuardConfig;
//!
//! struct Echo;
//! impl PulseSource for Echo {
//!     fn measure(&mut self) -> RawPulseSample { RawPulseSample::valid(5830) }
//! }
//!
//! struct Dht;
//! impl EnvironmentSensor for Dht {
//!     fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
//!         Ok(EnvironmentReading::new(20.0, 50.0, 101.6))
//!     }
//! }
//!
//! struct Offline;
//! impl TelemetryUplink for Offline {
//!     fn publish(&mut self, _: Topic, _: &Message) -> Result<(), UplinkError> {
//!         Err(UplinkError::NotConnected)
//!     }
//! }
//!
//! struct NoDelay;
//! impl embedded_hal::delay::DelayNs for NoDelay {
//!     fn delay_ns(&mut self, _: u32) {}
//! }
//!
//! let parts = Collaborators {
//!     pulses: Echo,
//!     environment: Dht,
//!     uplink: Offline,
//!     delay: NoDelay,
//!     clock: FixedTime::new(0),
//! };
//! let mut device = Device::new(LevelGuardConfig::default(), parts, RtcRetainedStore::new()).unwrap();
//!
//! let report = device.run_cycle();
//! assert!(!report.publish_ok);
//! assert_eq!(report.pending, 1);
//! assert!(report.plan.duration_seconds >= 60);
//! ```

use embedded_hal::delay::DelayNs;

use crate::calibration::{CalibrationEngine, CalibrationResult};
use crate::config::LevelGuardConfig;
use crate::errors::{ConfigResult, UplinkError};
use crate::history::HistoryBuffer;
use crate::retained::{RetainedState, RetainedStore};
use crate::sampler::{DistanceMeasurement, MeasurementSampler};
use crate::scheduler::{CycleOutcome, CyclePhase, DutyCycleScheduler, SleepPlan, SleepReason};
use crate::sound::{EstimateSource, SpeedModel, SpeedOfSoundEstimate};
use crate::telemetry::{HealthReport, Message, ReadingPayload, Topic};
use crate::time::{elapsed_ms, TimeSource};
use crate::traits::{EnvironmentSensor, PowerManager, PulseSource, TelemetryUplink};

/// Board-side collaborators the pipeline drives
pub struct Collaborators<P, S, U, D, C> {
    /// Ultrasonic transducer
    pub pulses: P,
    /// Temperature and humidity sensor
    pub environment: S,
    /// Telemetry link
    pub uplink: U,
    /// Blocking delay between readings
    pub delay: D,
    /// Timestamps for measurements and drift
    pub clock: C,
}

/// Summary of one wake cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number since cold start
    pub cycle: u32,
    /// `None` when no calibration was due
    pub calibration: Option<CalibrationResult>,
    /// Measurement taken this cycle
    pub measurement: DistanceMeasurement,
    /// Entry dropped from a full history buffer this cycle
    pub evicted: Option<DistanceMeasurement>,
    /// The health report reached the uplink
    pub health_published: bool,
    /// Readings confirmed by the uplink this cycle
    pub readings_published: usize,
    /// Readings still buffered after publishing
    pub pending: usize,
    /// Health and every pending reading were delivered
    pub publish_ok: bool,
    /// Sleep decided for the end of the cycle
    pub plan: SleepPlan,
}

/// The level sensor node
pub struct Device<P, S, U, D, C, R> {
    config: LevelGuardConfig,
    model: SpeedModel,
    calibration: CalibrationEngine,
    sampler: MeasurementSampler,
    scheduler: DutyCycleScheduler,
    parts: Collaborators<P, S, U, D, C>,
    store: R,
    state: RetainedState,
    estimate: SpeedOfSoundEstimate,
    last_plan: Option<SleepPlan>,
}

impl<P, S, U, D, C, R> Device<P, S, U, D, C, R>
where
    P: PulseSource,
    S: EnvironmentSensor,
    U: TelemetryUplink,
    D: DelayNs,
    C: TimeSource,
    R: RetainedStore,
{
    /// Validate the configuration, build the pipeline and restore retained
    /// state. Fails before any measurement on an invalid configuration.
    pub fn new(
        config: LevelGuardConfig,
        parts: Collaborators<P, S, U, D, C>,
        mut store: R,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let model = SpeedModel::from_config(&config)?;

        let state = restore(&mut store, config.buffer_capacity)?;
        let estimate = state
            .last_estimate
            .unwrap_or_else(|| SpeedOfSoundEstimate::cold_start(&model, config.mean_pressure_kpa));

        log_info!(
            "Device ready: cycle {}, {} buffered, {} m/s",
            state.cycle_count,
            state.history.len() as u32,
            estimate.speed_m_per_s
        );

        Ok(Self {
            calibration: CalibrationEngine::new(&config),
            sampler: MeasurementSampler::new(&config),
            scheduler: DutyCycleScheduler::with_failures(&config, state.consecutive_publish_failures),
            config,
            model,
            parts,
            store,
            state,
            estimate,
            last_plan: None,
        })
    }

    /// Run one complete wake cycle
    pub fn run_cycle(&mut self) -> CycleReport {
        self.scheduler.wake();
        let started = self.parts.clock.now();
        let cycle = self.state.cycle_count.wrapping_add(1);

        let calibration = if self.calibration_due() {
            self.enter(CyclePhase::Calibrating);
            let result = self.calibration.refresh(
                &mut self.parts.environment,
                &mut self.parts.delay,
                &self.model,
                &mut self.estimate,
            );
            if result.accepted {
                self.state.last_estimate = Some(self.estimate);
            }
            Some(result)
        } else {
            None
        };

        self.enter(CyclePhase::Sampling);
        let timestamp = self.parts.clock.now();
        let measurement = self.sampler.sample(
            &mut self.parts.pulses,
            &mut self.parts.delay,
            &self.estimate,
            timestamp,
        );
        let evicted = self.state.history.push(measurement);

        self.enter(CyclePhase::Publishing);
        let health = self.health_report(cycle, calibration.as_ref());
        let health_published = publish(&mut self.parts.uplink, &Message::Health(health)).is_ok();

        let readings_published = if health_published {
            let uplink = &mut self.parts.uplink;
            self.state
                .history
                .drain_confirmed(|m| publish(uplink, &Message::Reading(ReadingPayload::from(m))).is_ok())
                .len()
        } else {
            0
        };

        let pending = self.state.history.len();
        let publish_ok = health_published && pending == 0;

        let outcome = CycleOutcome {
            publish_ok,
            readings_pending: pending,
            active_ms: elapsed_ms(started, self.parts.clock.now()),
        };
        let plan = self.scheduler.plan_next_sleep(&outcome);

        self.state.cycle_count = cycle;
        self.state.consecutive_publish_failures = self.scheduler.consecutive_publish_failures();
        self.persist();
        self.enter(CyclePhase::Sleeping);
        self.last_plan = Some(plan);

        CycleReport {
            cycle,
            calibration,
            measurement,
            evicted,
            health_published,
            readings_published,
            pending,
            publish_ok,
            plan,
        }
    }

    /// Hand the planned sleep to the power manager. Without a completed
    /// cycle the configured interval is used.
    pub fn sleep<M: PowerManager>(&mut self, power: &mut M) -> SleepPlan {
        let plan = self.last_plan.unwrap_or(SleepPlan {
            duration_seconds: self.scheduler.baseline_seconds(),
            reason: SleepReason::Scheduled,
        });
        power.sleep(plan.duration_seconds);
        plan
    }

    /// Fire one pulse and report on the test topic
    pub fn self_test(&mut self) -> Result<(), UplinkError> {
        let note = if self.parts.pulses.measure().is_valid() {
            "self-test: echo ok"
        } else {
            "self-test: no echo"
        };
        publish(&mut self.parts.uplink, &Message::Diagnostic(note))
    }

    /// Configuration the device was built with
    pub fn config(&self) -> &LevelGuardConfig {
        &self.config
    }

    /// Speed-of-sound strategy in use
    pub fn model(&self) -> &SpeedModel {
        &self.model
    }

    /// Speed of sound currently applied to measurements
    pub fn estimate(&self) -> &SpeedOfSoundEstimate {
        &self.estimate
    }

    /// Readings not yet confirmed by the uplink
    pub fn history(&self) -> &HistoryBuffer {
        &self.state.history
    }

    /// Everything that survives deep sleep
    pub fn state(&self) -> &RetainedState {
        &self.state
    }

    /// Current phase of the wake cycle
    pub fn phase(&self) -> CyclePhase {
        self.scheduler.phase()
    }

    /// Board collaborators
    pub fn collaborators(&self) -> &Collaborators<P, S, U, D, C> {
        &self.parts
    }

    /// Board collaborators, for reconfiguring between cycles
    pub fn collaborators_mut(&mut self) -> &mut Collaborators<P, S, U, D, C> {
        &mut self.parts
    }

    /// Tear down, returning the collaborators and the store
    pub fn release(self) -> (Collaborators<P, S, U, D, C>, R) {
        (self.parts, self.store)
    }

    fn calibration_due(&self) -> bool {
        self.estimate.source != EstimateSource::Calibrated
            || self.state.cycle_count % self.config.calibrate_every_n_cycles.max(1) == 0
    }

    fn enter(&mut self, phase: CyclePhase) {
        let entered = self.scheduler.advance(phase);
        debug_assert!(entered.is_ok(), "cycle order broken: {:?}", entered);
    }

    fn health_report(&self, cycle: u32, calibration: Option<&CalibrationResult>) -> HealthReport {
        HealthReport {
            cycle_count: cycle,
            buffer_len: self.state.history.len() as u8,
            buffer_capacity: self.state.history.capacity() as u8,
            evicted_total: self.state.history.evicted_total(),
            consecutive_publish_failures: self.scheduler.consecutive_publish_failures(),
            calibration_accepted: calibration.map(|c| c.accepted),
            speed_of_sound_m_per_s: self.estimate.speed_m_per_s,
            estimate_source: self.estimate.source,
        }
    }

    fn persist(&mut self) {
        if self.store.save(&self.state).is_err() {
            log_warn!("Retained state not saved; next wake may start cold");
        }
    }
}

/// Load retained state, falling back to a cold start. A snapshot taken with
/// a different capacity is replayed into a resized buffer, which keeps the
/// newest entries.
fn restore<R: RetainedStore>(store: &mut R, capacity: usize) -> ConfigResult<RetainedState> {
    match store.load() {
        Ok(Some(mut state)) => {
            if state.history.capacity() != capacity {
                let mut resized = HistoryBuffer::new(capacity)?;
                for m in state.history.drain() {
                    resized.push(m);
                }
                state.history = resized;
            }
            Ok(state)
        }
        Ok(None) => {
            log_info!("No retained state, cold start");
            RetainedState::cold(capacity)
        }
        Err(_) => {
            log_warn!("Retained state unreadable, cold start");
            RetainedState::cold(capacity)
        }
    }
}

/// Publish on the message's own topic, logging a failure
fn publish<U: TelemetryUplink>(uplink: &mut U, message: &Message) -> Result<(), UplinkError> {
    let topic = message.default_topic();
    uplink
        .publish(topic, message)
        .inspect_err(|e| log_publish_failure(topic, *e))
}

fn log_publish_failure(topic: Topic, error: UplinkError) {
    let reason = match error {
        UplinkError::Timeout => "timeout",
        UplinkError::Rejected { reason } => reason,
        UplinkError::NotConnected => "not connected",
        UplinkError::Encoding => "encoding",
    };
    log_warn!("Publish on {} failed: {}", topic.name(), reason);
}

//! Shared mocks for integration tests
//!
//! Every board collaborator has a scripted or recording stand-in here:
//! - `ScriptedPulses`: replays a fixed list of echo samples
//! - `EnvironmentStream`: replays temperature/humidity readings
//! - `RecordingUplink`: records publishes, can be switched offline
//! - `RecordingPower`: records requested sleeps
//! - `NoDelay`: counts delays without sleeping

#![allow(dead_code)]

pub mod scenarios;

use embedded_hal::delay::DelayNs;

use levelguard_core::{
    device::{Collaborators, Device},
    errors::{SensorError, UplinkError},
    pulse::RawPulseSample,
    retained::RtcRetainedStore,
    telemetry::{HealthReport, Message, ReadingPayload, Topic},
    time::FixedTime,
    traits::{EnvironmentReading, EnvironmentSensor, PowerManager, PulseSource, TelemetryUplink},
    LevelGuardConfig,
};

/// Replays `script` cyclically
pub struct ScriptedPulses {
    script: Vec<RawPulseSample>,
    pub calls: usize,
}

impl ScriptedPulses {
    pub fn new(script: Vec<RawPulseSample>) -> Self {
        assert!(!script.is_empty());
        Self { script, calls: 0 }
    }

    /// Same echo every time
    pub fn constant(duration_us: u32) -> Self {
        Self::new(vec![RawPulseSample::valid(duration_us)])
    }

    /// Never an echo
    pub fn silent() -> Self {
        Self::new(vec![RawPulseSample::timeout()])
    }
}

impl PulseSource for ScriptedPulses {
    fn measure(&mut self) -> RawPulseSample {
        let sample = self.script[self.calls % self.script.len()];
        self.calls += 1;
        sample
    }
}

/// Replays environment readings cyclically
pub struct EnvironmentStream {
    readings: Vec<Result<EnvironmentReading, SensorError>>,
    pub calls: usize,
}

impl EnvironmentStream {
    pub fn new(readings: Vec<Result<EnvironmentReading, SensorError>>) -> Self {
        assert!(!readings.is_empty());
        Self { readings, calls: 0 }
    }

    /// Temperature/humidity pairs at site pressure
    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(t, rh)| Ok(EnvironmentReading::new(t, rh, 101.6)))
                .collect(),
        )
    }

    pub fn steady(temperature_c: f32, humidity_pct: f32) -> Self {
        Self::from_pairs(&[(temperature_c, humidity_pct)])
    }

    /// Replace what the sensor reports from now on
    pub fn set_pairs(&mut self, pairs: &[(f32, f32)]) {
        *self = Self {
            calls: self.calls,
            ..Self::from_pairs(pairs)
        };
    }
}

impl EnvironmentSensor for EnvironmentStream {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        let reading = self.readings[self.calls % self.readings.len()];
        self.calls += 1;
        reading
    }
}

/// Records every publish; fails all of them while `fail_with` is set
#[derive(Default)]
pub struct RecordingUplink {
    pub sent: Vec<(Topic, Message)>,
    pub attempts: usize,
    pub fail_with: Option<UplinkError>,
    /// Accept this many publishes, then fail with `Timeout`
    pub accept_budget: Option<usize>,
}

impl RecordingUplink {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            fail_with: Some(UplinkError::NotConnected),
            ..Self::default()
        }
    }

    pub fn readings(&self) -> Vec<ReadingPayload> {
        self.sent
            .iter()
            .filter_map(|(_, m)| match m {
                Message::Reading(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn health_reports(&self) -> Vec<HealthReport> {
        self.sent
            .iter()
            .filter_map(|(_, m)| match m {
                Message::Health(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.sent.iter().map(|(t, _)| *t).collect()
    }
}

impl TelemetryUplink for RecordingUplink {
    fn publish(&mut self, topic: Topic, message: &Message) -> Result<(), UplinkError> {
        self.attempts += 1;
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        if let Some(budget) = self.accept_budget.as_mut() {
            if *budget == 0 {
                return Err(UplinkError::Timeout);
            }
            *budget -= 1;
        }
        self.sent.push((topic, *message));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPower {
    pub sleeps: Vec<u32>,
}

impl PowerManager for RecordingPower {
    fn sleep(&mut self, duration_seconds: u32) {
        self.sleeps.push(duration_seconds);
    }
}

#[derive(Default)]
pub struct NoDelay {
    pub calls: usize,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}

pub type TestDevice =
    Device<ScriptedPulses, EnvironmentStream, RecordingUplink, NoDelay, FixedTime, RtcRetainedStore>;

/// Device with owned mocks. The clock advances 100 ms per read.
pub fn device(
    config: LevelGuardConfig,
    pulses: ScriptedPulses,
    environment: EnvironmentStream,
    uplink: RecordingUplink,
) -> TestDevice {
    device_with_store(config, pulses, environment, uplink, RtcRetainedStore::new())
}

pub fn device_with_store(
    config: LevelGuardConfig,
    pulses: ScriptedPulses,
    environment: EnvironmentStream,
    uplink: RecordingUplink,
    store: RtcRetainedStore,
) -> TestDevice {
    let parts = Collaborators {
        pulses,
        environment,
        uplink,
        delay: NoDelay::default(),
        clock: FixedTime::stepping(1_000_000, 100),
    };
    Device::new(config, parts, store).expect("valid test configuration")
}

//! Core measurement pipeline for LevelGuard
//!
//! Turns ultrasonic time-of-flight into a compensated liquid-level distance,
//! buffers readings across deep sleep and decides when to wake next.
//! Designed for battery-powered nodes that are awake for seconds per hour.
//!
//! Key constraints:
//! - Runs on an ESP32 with the radio off most of the time
//! - No heap allocation in the measurement path
//! - Every cycle ends in a valid sleep plan, whatever failed
//!
//! ```no_run
//! use levelguard_core::{LevelGuardConfig, SpeedModel, SpeedOfSoundModel};
//!
//! let config = LevelGuardConfig::default();
//! config.validate().expect("invalid configuration");
//!
//! let model = SpeedModel::from_config(&config).unwrap();
//! let c = model.estimate(18.5, 72.0, 101.6);
//! let distance_m = 0.005_83 * c / 2.0;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod buffer;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod device;
pub mod errors;
pub mod history;
pub mod pulse;
pub mod retained;
pub mod sampler;
pub mod scheduler;
pub mod sound;
pub mod stats;
pub mod telemetry;
pub mod time;
pub mod traits;

// Public API
pub use calibration::{CalibrationEngine, CalibrationResult};
pub use config::{LevelGuardConfig, PinConfig, SpeedStrategy};
pub use device::{Collaborators, CycleReport, Device};
pub use errors::{ConfigError, ConfigResult, SensorError, StoreError, UplinkError};
pub use history::HistoryBuffer;
pub use pulse::{PulseStatus, PulseTimer, RawPulseSample};
pub use retained::{RetainedState, RetainedStore, RtcRetainedStore};
pub use sampler::{DistanceMeasurement, MeasurementSampler, Reduction};
pub use scheduler::{
    CycleOutcome, CyclePhase, DutyCycleScheduler, SleepPlan, SleepPolicy, SleepReason,
};
pub use sound::{
    CalculatedSpeedModel, EstimateSource, InterpolatedSpeedModel, SpeedModel,
    SpeedOfSoundEstimate,
};
pub use telemetry::{HealthReport, Message, ReadingPayload, Topic};
pub use time::{MicrosClock, MicrosInstant, TimeSource};
pub use traits::{
    EnvironmentReading, EnvironmentSensor, PowerManager, PulseSource, SpeedOfSoundModel,
    TelemetryUplink,
};

#[cfg(feature = "std")]
pub use retained::FileRetainedStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

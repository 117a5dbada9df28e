//! Constants for LevelGuard Core
//!
//! Centralized, documented constants. Defaults in
//! [`LevelGuardConfig`](crate::config::LevelGuardConfig) are built from these.
//!
//! ## Organization
//!
//! - **Physics**: gas constants and the speed-of-sound envelope
//! - **Sensors**: ultrasonic transducer and DHT22 characteristics
//! - **Time**: conversions and duty-cycle defaults
//! - **Buffers**: fixed storage bounds

/// Physical constants for acoustic ranging.
pub mod physics;

/// Sensor specifications and calibration thresholds.
pub mod sensors;

/// Time conversions and duty-cycle defaults.
pub mod time;

/// Buffer sizes and memory constraints.
pub mod buffers;

pub use physics::{
    ABSOLUTE_ZERO_CELSIUS, MEAN_SITE_PRESSURE_KPA, SPEED_OF_SOUND_AIR_20C_M_PER_S,
};

pub use sensors::{
    ECHO_TIMEOUT_US, MAX_STD_DEV_HUMIDITY_PCT, MAX_STD_DEV_TEMP_C, TRIGGER_PULSE_WIDTH_US,
};

pub use time::{MIN_SLEEP_SECONDS, MS_PER_SECOND, SECONDS_PER_MINUTE};

pub use buffers::{MAX_HISTORY_CAPACITY, MAX_READINGS, NUM_TX_VARIABLES};

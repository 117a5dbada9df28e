//! Sensor Specifications and Limits
//!
//! Operating characteristics of the reference hardware: an AJ-SR04M /
//! JSN-SR04T waterproof ultrasonic transducer and a DHT22 temperature and
//! humidity sensor.

// ===== ULTRASONIC TRANSDUCER =====

/// Minimum trigger pulse width (µs).
///
/// Source: AJ-SR04M datasheet
pub const TRIGGER_PULSE_WIDTH_US: u32 = 10;

/// Settle time with the trigger held low before each pulse (µs).
pub const TRIGGER_SETTLE_US: u32 = 2;

/// Echo timeout (µs).
///
/// The module holds echo high for ~38 ms when nothing returns.
pub const ECHO_TIMEOUT_US: u32 = 38_000;

/// Polling step while waiting on the echo pin (µs).
pub const ECHO_POLL_STEP_US: u32 = 1;

/// Blind zone of the transducer (m).
pub const ULTRASONIC_MIN_RANGE_M: f32 = 0.20;

/// Maximum rated range (m).
pub const ULTRASONIC_MAX_RANGE_M: f32 = 6.0;

// ===== DHT22 =====

/// Minimum interval between two DHT22 reads (ms).
///
/// Faster polling returns the cached value of the previous conversion.
/// Configurations below it are accepted with a warning.
pub const DHT22_MIN_INTERVAL_MS: u32 = 2000;

// ===== CALIBRATION THRESHOLDS =====

/// Maximum tolerated temperature standard deviation in a calibration pass (°C).
pub const MAX_STD_DEV_TEMP_C: f32 = 2.0;

/// Maximum tolerated humidity standard deviation in a calibration pass (%RH).
pub const MAX_STD_DEV_HUMIDITY_PCT: f32 = 3.0;

/// Minimum valid readings for a meaningful standard deviation.
pub const MIN_VALID_CALIBRATION_SAMPLES: usize = 2;

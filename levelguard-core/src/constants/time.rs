//! Time-Related Constants
//!
//! Conversion factors and default intervals for the wake/measure/sleep loop.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Microseconds per second.
pub const US_PER_SECOND: f32 = 1_000_000.0;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Milliseconds per hour.
pub const MS_PER_HOUR: f32 = 3_600_000.0;

// ===== DUTY CYCLE =====

/// Default time between wake-ups (minutes).
pub const DEFAULT_SLEEP_INTERVAL_MIN: i32 = 10;

/// Sleep floor (seconds). Enforced even when misconfigured to zero or below.
pub const MIN_SLEEP_SECONDS: u32 = SECONDS_PER_MINUTE;

/// Default pause between two distance readings (ms).
pub const DEFAULT_READING_INTERVAL_MS: u32 = 100;

/// Default pause between two calibration readings (ms).
pub const DEFAULT_CALIBRATION_INTERVAL_MS: u32 = 100;

/// Upper bound on the backoff multiplier for repeated publish failures.
pub const DEFAULT_BACKOFF_MAX_FACTOR: u32 = 6;

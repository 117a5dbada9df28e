//! Buffer Sizes and Memory Constraints
//!
//! Everything the pipeline stores lives in fixed-size arrays sized here.

/// Hard upper bound on the history buffer capacity.
///
/// The reference firmware indexes the ring with a `u8`.
pub const MAX_HISTORY_CAPACITY: usize = 255;

/// Default history buffer capacity (measurements).
///
/// 10 entries at a 10 minute interval survive ~100 minutes of outage.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Maximum pulse attempts in one measurement window.
pub const MAX_READINGS: usize = 64;

/// Default pulse attempts per measurement window.
pub const DEFAULT_NUM_READINGS: usize = 10;

/// Maximum environment readings in one calibration pass.
pub const MAX_CALIBRATIONS: usize = 64;

/// Default environment readings per calibration pass.
pub const DEFAULT_NUM_CALIBRATIONS: usize = 10;

/// Number of variables in one readings payload.
pub const NUM_TX_VARIABLES: usize = 8;

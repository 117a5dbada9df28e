//! Error Types for the Measurement Pipeline
//!
//! ## Design Philosophy
//!
//! Errors follow the same embedded constraints as the rest of the crate:
//! small, `Copy`, no heap (only `&'static str` for messages).
//!
//! ## Error Taxonomy
//!
//! Only [`ConfigError`] is fatal. Everything else is recovered inside the
//! cycle and the device always reaches its sleep phase:
//!
//! | Condition                  | Type                        | Recovery                               |
//! |----------------------------|-----------------------------|----------------------------------------|
//! | Pulse / environment timeout| `SensorError::Timeout`      | sample excluded from the aggregate     |
//! | Calibration instability    | `CalibrationResult::accepted == false` | previous estimate kept      |
//! | Every pulse invalid        | failed `DistanceMeasurement`| cycle continues, failure is published  |
//! | Publish failed / timed out | [`UplinkError`]             | entry stays in the history buffer      |
//! | Conflicting configuration  | [`ConfigError`]             | device refuses to start                |
//!
//! ```rust
//! use levelguard_core::{LevelGuardConfig, ConfigError};
//!
//! let mut config = LevelGuardConfig::default();
//! config.interpolate_speed_of_sound = true; // calculated is already on
//! assert_eq!(config.validate(), Err(ConfigError::ConflictingSpeedStrategy));
//! ```

use thiserror_no_std::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal configuration errors. Raised before the measurement loop starts.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Both the calculated and the interpolated speed-of-sound strategies are selected
    #[error("Both speed-of-sound strategies selected (calculated and interpolated)")]
    ConflictingSpeedStrategy,

    /// No speed-of-sound strategy is selected
    #[error("No speed-of-sound strategy selected")]
    MissingSpeedStrategy,

    /// Lookup grid dimensions do not fit the shipped table
    #[error("Invalid speed-of-sound grid {cols}x{rows}")]
    InvalidGrid {
        /// Temperature column count
        cols: usize,
        /// Humidity row count
        rows: usize,
    },

    /// History buffer capacity outside 1..=255
    #[error("Invalid buffer capacity {capacity}")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
    },

    /// A count parameter is outside its supported range
    #[error("{name} = {value} outside [{min}, {max}]")]
    CountOutOfRange {
        /// Parameter name
        name: &'static str,
        /// Configured value
        value: usize,
        /// Smallest accepted value
        min: usize,
        /// Largest accepted value
        max: usize,
    },

    /// A threshold is zero, negative or not a number
    #[error("Invalid threshold {name}")]
    InvalidThreshold {
        /// Parameter name
        name: &'static str,
    },
}

/// Sensor read failures. Never fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer in time
    #[error("Sensor read timed out")]
    Timeout,

    /// Bus or pin level failure
    #[error("Sensor bus error: {reason}")]
    Bus {
        /// Short description from the driver
        reason: &'static str,
    },

    /// Sensor answered with NaN, infinity or an impossible value
    #[error("Sensor returned an invalid value")]
    InvalidValue,
}

/// Telemetry publish failures. A timeout is treated exactly like a rejection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkError {
    /// No acknowledgement before the collaborator's deadline
    #[error("Uplink timed out")]
    Timeout,

    /// Broker or modem refused the publish
    #[error("Uplink rejected publish: {reason}")]
    Rejected {
        /// Short description from the transport
        reason: &'static str,
    },

    /// Link is down
    #[error("Uplink not connected")]
    NotConnected,

    /// Payload could not be encoded
    #[error("Payload encoding failed")]
    Encoding,
}

/// Retained-state storage failures. A failed load means cold start.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Backing storage could not be read or written
    #[error("Retained storage I/O failed")]
    Io,

    /// Stored snapshot could not be decoded or violates an invariant
    #[error("Retained state corrupt: {reason}")]
    Corrupt {
        /// What was wrong with the snapshot
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ConflictingSpeedStrategy =>
                defmt::write!(fmt, "Both speed-of-sound strategies selected"),
            Self::MissingSpeedStrategy =>
                defmt::write!(fmt, "No speed-of-sound strategy selected"),
            Self::InvalidGrid { cols, rows } =>
                defmt::write!(fmt, "Invalid grid {}x{}", cols, rows),
            Self::InvalidCapacity { capacity } =>
                defmt::write!(fmt, "Invalid buffer capacity {}", capacity),
            Self::CountOutOfRange { name, value, min, max } =>
                defmt::write!(fmt, "{} = {} outside [{}, {}]", name, value, min, max),
            Self::InvalidThreshold { name } =>
                defmt::write!(fmt, "Invalid threshold {}", name),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for UplinkError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Timeout => defmt::write!(fmt, "Uplink timeout"),
            Self::Rejected { reason } => defmt::write!(fmt, "Uplink rejected: {}", reason),
            Self::NotConnected => defmt::write!(fmt, "Uplink not connected"),
            Self::Encoding => defmt::write!(fmt, "Payload encoding failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<UplinkError>() <= 24);
        assert!(core::mem::size_of::<SensorError>() <= 24);
    }
}

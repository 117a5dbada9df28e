//! Device configuration
//!
//! One explicit structure replaces the board's compile-time macros. It is
//! passed by reference into every component constructor so tests can
//! inject tiny buffers or zero thresholds without rebuilding.
//!
//! `validate()` is the fail-fast gate: [`Device::new`](crate::device::Device::new)
//! refuses to start on any [`ConfigError`].
//!
//! With the `std` feature the structure deserializes from JSON; missing
//! fields take the reference-board defaults.

use crate::constants::{buffers, physics, sensors, time};
use crate::errors::{ConfigError, ConfigResult};
use crate::sampler::Reduction;
use crate::scheduler::SleepPolicy;
use crate::sound::lookup::{MAX_GRID_ROWS, STANDARD_GRID_COLS};

/// Board pin assignments. Consumed by the board crate, not by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PinConfig {
    /// Transducer echo input
    pub echo: u8,
    /// Transducer trigger output
    pub trigger: u8,
    /// DHT22 data line
    pub dht: u8,
    /// Status LED
    pub led: u8,
    /// Modem UART receive
    pub modem_rx: u8,
    /// Modem UART transmit
    pub modem_tx: u8,
    /// Modem reset line
    pub modem_reset: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        // ESP32 LABTEL board
        Self {
            echo: 19,
            trigger: 18,
            dht: 21,
            led: 25,
            modem_rx: 16,
            modem_tx: 17,
            modem_reset: 26,
        }
    }
}

/// Which speed-of-sound model the device runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedStrategy {
    /// Closed-form ideal-gas model
    Calculated,
    /// Bilinear lookup in the pre-computed grid
    Interpolated,
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LevelGuardConfig {
    /// Board pin map
    pub pins: PinConfig,

    /// Environment readings per calibration pass
    pub num_calibrations: usize,
    /// Pause between calibration readings (ms)
    pub calibration_interval_ms: u32,
    /// Reject the calibration above this temperature spread (°C)
    pub max_std_dev_temperature_c: f32,
    /// Reject the calibration above this humidity spread (%RH)
    pub max_std_dev_humidity_pct: f32,
    /// Pressure used when the environment sensor has no barometer (kPa)
    pub mean_pressure_kpa: f32,
    /// Run a calibration pass every n-th cycle (1 = every cycle)
    pub calibrate_every_n_cycles: u32,

    /// Pulse attempts per measurement
    pub num_readings: usize,
    /// Pause between pulse attempts (ms)
    pub reading_interval_ms: u32,
    /// How valid samples are reduced to one distance
    pub reduction: Reduction,
    /// Trigger pulse width (µs)
    pub trigger_width_us: u32,
    /// Echo wait limit (µs)
    pub echo_timeout_us: u32,

    /// History ring capacity (1..=255)
    pub buffer_capacity: usize,

    /// Baseline sleep between cycles (minutes). Values below 1 are floored.
    pub sleep_interval_min: i32,
    /// How the next sleep is derived from the cycle outcome
    pub sleep_policy: SleepPolicy,

    /// Select the calculated speed-of-sound model
    pub calculate_speed_of_sound: bool,
    /// Select the interpolated speed-of-sound model
    pub interpolate_speed_of_sound: bool,
    /// Temperature columns of the lookup grid
    pub speed_grid_cols: usize,
    /// Humidity rows of the lookup grid (at most 2)
    pub speed_grid_rows: usize,
}

impl Default for LevelGuardConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            num_calibrations: buffers::DEFAULT_NUM_CALIBRATIONS,
            calibration_interval_ms: time::DEFAULT_CALIBRATION_INTERVAL_MS,
            max_std_dev_temperature_c: sensors::MAX_STD_DEV_TEMP_C,
            max_std_dev_humidity_pct: sensors::MAX_STD_DEV_HUMIDITY_PCT,
            mean_pressure_kpa: physics::MEAN_SITE_PRESSURE_KPA,
            calibrate_every_n_cycles: 1,
            num_readings: buffers::DEFAULT_NUM_READINGS,
            reading_interval_ms: time::DEFAULT_READING_INTERVAL_MS,
            reduction: Reduction::Mean,
            trigger_width_us: sensors::TRIGGER_PULSE_WIDTH_US,
            echo_timeout_us: sensors::ECHO_TIMEOUT_US,
            buffer_capacity: buffers::DEFAULT_HISTORY_CAPACITY,
            sleep_interval_min: time::DEFAULT_SLEEP_INTERVAL_MIN,
            sleep_policy: SleepPolicy::Fixed,
            calculate_speed_of_sound: true,
            interpolate_speed_of_sound: false,
            speed_grid_cols: STANDARD_GRID_COLS,
            speed_grid_rows: MAX_GRID_ROWS,
        }
    }
}

impl LevelGuardConfig {
    /// Resolve the mutually exclusive strategy flags
    pub fn speed_strategy(&self) -> ConfigResult<SpeedStrategy> {
        match (self.calculate_speed_of_sound, self.interpolate_speed_of_sound) {
            (true, false) => Ok(SpeedStrategy::Calculated),
            (false, true) => Ok(SpeedStrategy::Interpolated),
            (true, true) => Err(ConfigError::ConflictingSpeedStrategy),
            (false, false) => Err(ConfigError::MissingSpeedStrategy),
        }
    }

    /// Calibration reads come faster than the DHT22 converts, so some of
    /// them repeat the previous value and understate the spread
    pub fn calibration_outpaces_sensor(&self) -> bool {
        self.calibration_interval_ms < sensors::DHT22_MIN_INTERVAL_MS
    }

    /// Check every constraint the pipeline relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.speed_strategy()? == SpeedStrategy::Interpolated {
            check_grid(self.speed_grid_cols, self.speed_grid_rows)?;
        }

        if self.buffer_capacity == 0 || self.buffer_capacity > buffers::MAX_HISTORY_CAPACITY {
            return Err(ConfigError::InvalidCapacity {
                capacity: self.buffer_capacity,
            });
        }

        check_count("num_readings", self.num_readings, 1, buffers::MAX_READINGS)?;
        check_count(
            "num_calibrations",
            self.num_calibrations,
            sensors::MIN_VALID_CALIBRATION_SAMPLES,
            buffers::MAX_CALIBRATIONS,
        )?;
        check_count(
            "calibrate_every_n_cycles",
            self.calibrate_every_n_cycles as usize,
            1,
            u32::MAX as usize,
        )?;

        check_threshold("max_std_dev_temperature_c", self.max_std_dev_temperature_c)?;
        check_threshold("max_std_dev_humidity_pct", self.max_std_dev_humidity_pct)?;
        check_threshold("mean_pressure_kpa", self.mean_pressure_kpa)?;

        if let SleepPolicy::Backoff { max_factor } = self.sleep_policy {
            check_count("backoff max_factor", max_factor as usize, 1, 1024)?;
        }

        if self.calibration_outpaces_sensor() {
            log_warn!(
                "Calibration interval {} ms is below the DHT22 minimum of {} ms",
                self.calibration_interval_ms,
                sensors::DHT22_MIN_INTERVAL_MS
            );
        }

        Ok(())
    }
}

fn check_grid(cols: usize, rows: usize) -> ConfigResult<()> {
    if cols != STANDARD_GRID_COLS || rows == 0 || rows > MAX_GRID_ROWS {
        return Err(ConfigError::InvalidGrid { cols, rows });
    }
    Ok(())
}

fn check_count(name: &'static str, value: usize, min: usize, max: usize) -> ConfigResult<()> {
    if value < min || value > max {
        return Err(ConfigError::CountOutOfRange { name, value, min, max });
    }
    Ok(())
}

fn check_threshold(name: &'static str, value: f32) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidThreshold { name });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LevelGuardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.speed_strategy(), Ok(SpeedStrategy::Calculated));
        assert_eq!(config.num_readings, 10);
        assert_eq!(config.buffer_capacity, 10);
    }

    #[test]
    fn fast_calibration_is_flagged_but_valid() {
        let config = LevelGuardConfig::default();
        assert_eq!(config.calibration_interval_ms, 100);
        assert!(config.calibration_outpaces_sensor());
        assert!(config.validate().is_ok());

        let paced = LevelGuardConfig {
            calibration_interval_ms: 2000,
            ..Default::default()
        };
        assert!(!paced.calibration_outpaces_sensor());
        assert!(paced.validate().is_ok());
    }

    #[test]
    fn both_strategies_rejected() {
        let config = LevelGuardConfig {
            interpolate_speed_of_sound: true,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ConflictingSpeedStrategy));
    }

    #[test]
    fn no_strategy_rejected() {
        let config = LevelGuardConfig {
            calculate_speed_of_sound: false,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingSpeedStrategy));
    }

    #[test]
    fn three_humidity_rows_rejected() {
        let config = LevelGuardConfig {
            calculate_speed_of_sound: false,
            interpolate_speed_of_sound: true,
            speed_grid_rows: 3,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidGrid { cols: 51, rows: 3 })
        );
    }

    #[test]
    fn grid_ignored_for_calculated_model() {
        let config = LevelGuardConfig {
            speed_grid_rows: 7,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn capacity_bounds() {
        for capacity in [0, 256] {
            let config = LevelGuardConfig {
                buffer_capacity: capacity,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::InvalidCapacity { capacity }));
        }
    }

    #[test]
    fn zero_threshold_rejected() {
        let config = LevelGuardConfig {
            max_std_dev_humidity_pct: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { name: "max_std_dev_humidity_pct" })
        ));
    }

    #[test]
    fn negative_sleep_interval_is_not_a_config_error() {
        // Floored by the scheduler instead
        let config = LevelGuardConfig {
            sleep_interval_min: -5,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "std")]
    #[test]
    fn partial_json_takes_defaults() {
        let json = r#"{ "num_readings": 5, "sleep_interval_min": 30, "reduction": "Median" }"#;
        let config: LevelGuardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.num_readings, 5);
        assert_eq!(config.sleep_interval_min, 30);
        assert_eq!(config.reduction, Reduction::Median);
        assert_eq!(config.buffer_capacity, 10);
        assert!(config.validate().is_ok());
    }
}

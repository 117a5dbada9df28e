//! Environment Calibration
//!
//! ## Overview
//!
//! Before trusting a distance, the node takes a short burst of
//! temperature/humidity readings and checks that they agree with each
//! other. A DHT22 that has just been powered, or sits in a draught, drifts
//! by several degrees within a second; feeding that into the speed of sound
//! would move the reported level by centimetres.
//!
//! ## Acceptance Rule
//!
//! ```text
//! accepted = valid ≥ 2  ∧  σ_T ≤ max_σ_T  ∧  σ_RH ≤ max_σ_RH
//! ```
//!
//! σ is the population standard deviation (see [`crate::stats`]). A
//! rejected pass is a status, not a fault: the caller keeps whatever
//! estimate it already had and tries again next cycle.
//!
//! ## Sampling
//!
//! All `num_calibrations` reads are attempted, even when an early outlier
//! already makes rejection certain; stopping early would make σ depend on
//! where in the burst the outlier fell. Reads that fail or fall outside the
//! DHT22 envelope are excluded but still count as attempts.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::LevelGuardConfig;
use crate::constants::buffers::MAX_CALIBRATIONS;
use crate::constants::sensors::MIN_VALID_CALIBRATION_SAMPLES;
use crate::sound::SpeedOfSoundEstimate;
use crate::stats;
use crate::traits::{EnvironmentReading, EnvironmentSensor, SpeedOfSoundModel};

/// DHT22 operating envelope
const SENSOR_TEMP_MIN_C: f32 = -40.0;
const SENSOR_TEMP_MAX_C: f32 = 80.0;
const SENSOR_HUMIDITY_MIN_PCT: f32 = 0.0;
const SENSOR_HUMIDITY_MAX_PCT: f32 = 100.0;

/// Statistics of one calibration pass
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationResult {
    /// Mean of the valid temperatures (°C)
    pub mean_temperature_c: f32,
    /// Mean of the valid humidities (%)
    pub mean_humidity_pct: f32,
    /// Mean pressure, or the configured fallback (kPa)
    pub mean_pressure_kpa: f32,
    /// Population standard deviation of temperature
    pub std_dev_temperature_c: f32,
    /// Population standard deviation of humidity
    pub std_dev_humidity_pct: f32,
    /// Reads attempted
    pub samples_taken: u8,
    /// Reads that passed the sensor envelope
    pub samples_valid: u8,
    /// Stable enough to replace the active estimate
    pub accepted: bool,
}

impl CalibrationResult {
    /// Mean conditions of the pass
    pub fn environment(&self) -> EnvironmentReading {
        EnvironmentReading::new(
            self.mean_temperature_c,
            self.mean_humidity_pct,
            self.mean_pressure_kpa,
        )
    }
}

/// Runs calibration passes against the configured thresholds
#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    num_samples: usize,
    interval_ms: u32,
    max_std_dev_temperature_c: f32,
    max_std_dev_humidity_pct: f32,
    fallback_pressure_kpa: f32,
}

impl CalibrationEngine {
    /// Build from a validated configuration
    pub fn new(config: &LevelGuardConfig) -> Self {
        Self {
            num_samples: config.num_calibrations.min(MAX_CALIBRATIONS),
            interval_ms: config.calibration_interval_ms,
            max_std_dev_temperature_c: config.max_std_dev_temperature_c,
            max_std_dev_humidity_pct: config.max_std_dev_humidity_pct,
            fallback_pressure_kpa: config.mean_pressure_kpa,
        }
    }

    /// Take the configured burst of readings and compute its statistics
    pub fn calibrate<S, D>(&self, sensor: &mut S, delay: &mut D) -> CalibrationResult
    where
        S: EnvironmentSensor,
        D: DelayNs,
    {
        let mut temperatures: Vec<f32, MAX_CALIBRATIONS> = Vec::new();
        let mut humidities: Vec<f32, MAX_CALIBRATIONS> = Vec::new();
        let mut pressures: Vec<f32, MAX_CALIBRATIONS> = Vec::new();

        for i in 0..self.num_samples {
            match sensor.read_environment() {
                Ok(reading) if self.plausible(&reading) => {
                    let pressure = if reading.pressure_kpa.is_finite() && reading.pressure_kpa > 0.0 {
                        reading.pressure_kpa
                    } else {
                        self.fallback_pressure_kpa
                    };
                    // num_samples <= MAX_CALIBRATIONS, pushes cannot fail
                    let _ = temperatures.push(reading.temperature_c);
                    let _ = humidities.push(reading.humidity_pct);
                    let _ = pressures.push(pressure);
                }
                Ok(_) => {
                    log_debug!("Calibration sample {} outside sensor envelope", i);
                }
                Err(_) => {
                    log_debug!("Calibration sample {} failed", i);
                }
            }

            if i + 1 < self.num_samples {
                self.delay_between(delay);
            }
        }

        let result = self.evaluate(&temperatures, &humidities, &pressures);

        if result.accepted {
            log_info!(
                "Calibration accepted: T {} (sd {}), RH {} (sd {})",
                result.mean_temperature_c,
                result.std_dev_temperature_c,
                result.mean_humidity_pct,
                result.std_dev_humidity_pct
            );
        } else {
            log_warn!(
                "Calibration rejected: {}/{} valid, sd T {} (max {}), sd RH {} (max {})",
                result.samples_valid,
                result.samples_taken,
                result.std_dev_temperature_c,
                self.max_std_dev_temperature_c,
                result.std_dev_humidity_pct,
                self.max_std_dev_humidity_pct
            );
        }

        result
    }

    /// Calibrate and, only if accepted, replace `estimate`
    ///
    /// A rejected pass leaves `estimate` exactly as it was.
    pub fn refresh<S, D, M>(
        &self,
        sensor: &mut S,
        delay: &mut D,
        model: &M,
        estimate: &mut SpeedOfSoundEstimate,
    ) -> CalibrationResult
    where
        S: EnvironmentSensor,
        D: DelayNs,
        M: SpeedOfSoundModel,
    {
        let result = self.calibrate(sensor, delay);
        if result.accepted {
            *estimate = SpeedOfSoundEstimate::calibrated(model, result.environment());
            log_debug!("Speed of sound updated to {} m/s", estimate.speed_m_per_s);
        }
        result
    }

    fn plausible(&self, reading: &EnvironmentReading) -> bool {
        stats::in_range(reading.temperature_c, SENSOR_TEMP_MIN_C, SENSOR_TEMP_MAX_C)
            && stats::in_range(
                reading.humidity_pct,
                SENSOR_HUMIDITY_MIN_PCT,
                SENSOR_HUMIDITY_MAX_PCT,
            )
    }

    fn evaluate(&self, temperatures: &[f32], humidities: &[f32], pressures: &[f32]) -> CalibrationResult {
        let valid = temperatures.len();
        let std_t = stats::population_std_dev(temperatures).unwrap_or(f32::INFINITY);
        let std_h = stats::population_std_dev(humidities).unwrap_or(f32::INFINITY);

        let accepted = valid >= MIN_VALID_CALIBRATION_SAMPLES
            && std_t <= self.max_std_dev_temperature_c
            && std_h <= self.max_std_dev_humidity_pct;

        CalibrationResult {
            mean_temperature_c: stats::mean(temperatures).unwrap_or(f32::NAN),
            mean_humidity_pct: stats::mean(humidities).unwrap_or(f32::NAN),
            mean_pressure_kpa: stats::mean(pressures).unwrap_or(self.fallback_pressure_kpa),
            std_dev_temperature_c: std_t,
            std_dev_humidity_pct: std_h,
            samples_taken: self.num_samples as u8,
            samples_valid: valid as u8,
            accepted,
        }
    }

    fn delay_between<D: DelayNs>(&self, delay: &mut D) {
        if self.interval_ms > 0 {
            delay.delay_ms(self.interval_ms);
        }
    }
}

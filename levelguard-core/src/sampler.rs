//! Distance measurement window
//!
//! One measurement is a burst of `num_readings` trigger/echo attempts. Each
//! valid echo converts to a one-way distance with
//!
//! ```text
//! d = t · c / 2
//! ```
//!
//! where `t` is the round-trip time and `c` the speed of sound in force. The
//! valid distances are reduced to a single value, by default their mean.
//! Invalid attempts are counted but never contribute a value. A distance
//! outside the transducer's rated range (blind zone to maximum range) is a
//! stray echo and counts as invalid too. A window where every attempt failed
//! yields a measurement with `distance_m == None`, never a zero.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::LevelGuardConfig;
use crate::constants::buffers::MAX_READINGS;
use crate::constants::sensors::{ULTRASONIC_MAX_RANGE_M, ULTRASONIC_MIN_RANGE_M};
use crate::sound::SpeedOfSoundEstimate;
use crate::stats;
use crate::time::Timestamp;
use crate::traits::{EnvironmentReading, PulseSource};

/// How valid samples in a window collapse to one distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reduction {
    /// Arithmetic mean of the valid samples
    #[default]
    Mean,
    /// Median, robust against a single multipath echo
    Median,
}

impl Reduction {
    fn apply(self, values: &[f32]) -> Option<f32> {
        match self {
            Self::Mean => stats::mean(values),
            Self::Median => stats::median(values),
        }
    }
}

/// Result of one measurement window
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceMeasurement {
    /// Distance to the surface in metres. `None` when every attempt failed.
    pub distance_m: Option<f32>,
    /// When the window was taken (ms)
    pub timestamp_ms: Timestamp,
    /// Valid samples that went into `distance_m`
    pub source_sample_count: u8,
    /// Attempts that timed out, faulted or fell outside the rated range
    pub rejected_sample_count: u8,
    /// Speed of sound used for the conversion (m/s)
    pub speed_of_sound_m_per_s: f32,
    /// Conditions behind the speed of sound
    pub environment: EnvironmentReading,
}

impl DistanceMeasurement {
    /// No valid sample in the window
    pub fn is_failed(&self) -> bool {
        self.distance_m.is_none()
    }
}

/// Takes measurement windows with a fixed attempt count
#[derive(Debug, Clone)]
pub struct MeasurementSampler {
    num_readings: usize,
    interval_ms: u32,
    reduction: Reduction,
}

impl MeasurementSampler {
    /// Build from a validated configuration
    pub fn new(config: &LevelGuardConfig) -> Self {
        Self {
            num_readings: config.num_readings.clamp(1, MAX_READINGS),
            interval_ms: config.reading_interval_ms,
            reduction: config.reduction,
        }
    }

    /// Attempts per window
    pub fn num_readings(&self) -> usize {
        self.num_readings
    }

    /// Run one window. Always performs exactly `num_readings` attempts.
    pub fn sample<P, D>(
        &self,
        pulses: &mut P,
        delay: &mut D,
        estimate: &SpeedOfSoundEstimate,
        timestamp_ms: Timestamp,
    ) -> DistanceMeasurement
    where
        P: PulseSource,
        D: DelayNs,
    {
        let speed = estimate.speed_m_per_s;
        let mut distances: Vec<f32, MAX_READINGS> = Vec::new();
        let mut rejected = 0u8;

        for i in 0..self.num_readings {
            let sample = pulses.measure();
            match sample.time_of_flight_s().map(|tof| tof * speed / 2.0) {
                Some(d) if is_plausible(d) => {
                    // Bounded by MAX_READINGS
                    let _ = distances.push(d);
                }
                Some(d) => {
                    log_debug!("Discarding out-of-range echo at {} m", d);
                    rejected += 1;
                }
                None => rejected += 1,
            }

            if i + 1 < self.num_readings && self.interval_ms > 0 {
                delay.delay_ms(self.interval_ms);
            }
        }

        let distance_m = self.reduction.apply(&distances);
        match distance_m {
            Some(d) => {
                log_debug!(
                    "Distance {} m from {} samples ({} rejected)",
                    d,
                    distances.len() as u8,
                    rejected
                );
            }
            None => {
                log_warn!("All {} pulse attempts invalid", rejected);
            }
        }

        DistanceMeasurement {
            distance_m,
            timestamp_ms,
            source_sample_count: distances.len() as u8,
            rejected_sample_count: rejected,
            speed_of_sound_m_per_s: speed,
            environment: estimate.environment,
        }
    }
}

fn is_plausible(distance_m: f32) -> bool {
    (ULTRASONIC_MIN_RANGE_M..=ULTRASONIC_MAX_RANGE_M).contains(&distance_m)
}

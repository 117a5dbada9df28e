//! Collaborator traits
//!
//! The seams between the pipeline and the board. Keep them small: a board
//! crate implements each one over its drivers, tests implement them over
//! scripted data.

use crate::errors::{SensorError, UplinkError};
use crate::pulse::RawPulseSample;
use crate::telemetry::{Message, Topic};

/// One temperature / humidity / pressure triple
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvironmentReading {
    /// Air temperature (°C)
    pub temperature_c: f32,
    /// Relative humidity (%)
    pub humidity_pct: f32,
    /// Barometric pressure (kPa)
    pub pressure_kpa: f32,
}

impl EnvironmentReading {
    /// Build a reading
    pub const fn new(temperature_c: f32, humidity_pct: f32, pressure_kpa: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            pressure_kpa,
        }
    }

    /// All three channels are finite numbers
    pub fn is_finite(&self) -> bool {
        self.temperature_c.is_finite()
            && self.humidity_pct.is_finite()
            && self.pressure_kpa.is_finite()
    }
}

/// Source of time-of-flight samples
pub trait PulseSource {
    /// Fire one trigger and time the echo. Never blocks past its timeout.
    fn measure(&mut self) -> RawPulseSample;
}

/// Temperature/humidity(/pressure) sensor polled during calibration
pub trait EnvironmentSensor {
    /// Read the current conditions. Sensors without a barometer report the
    /// configured site pressure.
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError>;
}

/// Local speed of sound as a function of the environment
///
/// Every strategy shares this signature and these units so callers stay
/// agnostic of the choice.
pub trait SpeedOfSoundModel {
    /// Speed of sound in m/s
    fn estimate(&self, temperature_c: f32, humidity_pct: f32, pressure_kpa: f32) -> f32;

    /// Convenience wrapper over [`estimate`](Self::estimate)
    fn estimate_for(&self, env: &EnvironmentReading) -> f32 {
        self.estimate(env.temperature_c, env.humidity_pct, env.pressure_kpa)
    }
}

/// Outbound telemetry link
///
/// The implementation owns the deadline of every call. Returning
/// [`UplinkError::Timeout`] and any other error mean the same to the
/// scheduler: not delivered.
pub trait TelemetryUplink {
    /// Publish one message on a logical topic
    fn publish(&mut self, topic: Topic, message: &Message) -> Result<(), UplinkError>;
}

/// Power-management collaborator
pub trait PowerManager {
    /// Suspend until the next wake source fires. On real hardware this does
    /// not return; execution restarts from reset.
    fn sleep(&mut self, duration_seconds: u32);
}

impl<T: PulseSource + ?Sized> PulseSource for &mut T {
    fn measure(&mut self) -> RawPulseSample {
        (**self).measure()
    }
}

impl<T: EnvironmentSensor + ?Sized> EnvironmentSensor for &mut T {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        (**self).read_environment()
    }
}

impl<T: TelemetryUplink + ?Sized> TelemetryUplink for &mut T {
    fn publish(&mut self, topic: Topic, message: &Message) -> Result<(), UplinkError> {
        (**self).publish(topic, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_reading_detected() {
        assert!(EnvironmentReading::new(20.0, 50.0, 101.6).is_finite());
        assert!(!EnvironmentReading::new(f32::NAN, 50.0, 101.6).is_finite());
        assert!(!EnvironmentReading::new(20.0, f32::INFINITY, 101.6).is_finite());
    }
}

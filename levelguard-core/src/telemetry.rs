//! Uplink message model
//!
//! Three logical topics, mirroring the reference deployment:
//!
//! | Topic      | Name         | Content                                 |
//! |------------|--------------|-----------------------------------------|
//! | `System`   | `syscheck`   | [`HealthReport`] once per cycle         |
//! | `Readings` | `readings`   | one [`ReadingPayload`] per measurement  |
//! | `Test`     | `t`          | free-form diagnostics                   |
//!
//! How a topic name maps onto a broker path, and how a [`Message`] is
//! encoded, is the uplink implementation's business.

use crate::constants::buffers::NUM_TX_VARIABLES;
use crate::sampler::DistanceMeasurement;
use crate::sound::EstimateSource;
use crate::time::Timestamp;

/// Logical publish destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Topic {
    /// Node health
    System,
    /// Level readings
    Readings,
    /// Diagnostics
    Test,
}

impl Topic {
    /// Wire name of the topic
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "syscheck",
            Self::Readings => "readings",
            Self::Test => "t",
        }
    }
}

/// One buffered measurement as sent to the backend
///
/// Exactly [`NUM_TX_VARIABLES`] fields. A failed measurement is sent with
/// `distance_m: None` so the backend sees the gap instead of a zero level.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadingPayload {
    /// Distance to the surface (m), `None` for a failed window
    pub distance_m: Option<f32>,
    /// Measurement time (ms)
    pub timestamp_ms: Timestamp,
    /// Samples behind the distance
    pub valid_samples: u8,
    /// Attempts excluded from the window
    pub rejected_samples: u8,
    /// Speed of sound applied (m/s)
    pub speed_of_sound_m_per_s: f32,
    /// Temperature behind the speed of sound (°C)
    pub temperature_c: f32,
    /// Humidity behind the speed of sound (%)
    pub humidity_pct: f32,
    /// Pressure behind the speed of sound (kPa)
    pub pressure_kpa: f32,
}

impl ReadingPayload {
    /// Field count on the wire
    pub const FIELD_COUNT: usize = NUM_TX_VARIABLES;
}

impl From<&DistanceMeasurement> for ReadingPayload {
    fn from(m: &DistanceMeasurement) -> Self {
        Self {
            distance_m: m.distance_m,
            timestamp_ms: m.timestamp_ms,
            valid_samples: m.source_sample_count,
            rejected_samples: m.rejected_sample_count,
            speed_of_sound_m_per_s: m.speed_of_sound_m_per_s,
            temperature_c: m.environment.temperature_c,
            humidity_pct: m.environment.humidity_pct,
            pressure_kpa: m.environment.pressure_kpa,
        }
    }
}

/// Per-cycle node status for the system topic
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthReport {
    /// Wake cycles since cold start
    pub cycle_count: u32,
    /// Readings waiting in the history buffer
    pub buffer_len: u8,
    /// History buffer capacity
    pub buffer_capacity: u8,
    /// Readings lost to buffer overflow since cold start
    pub evicted_total: u32,
    /// Cycles in a row with a failed publish
    pub consecutive_publish_failures: u32,
    /// `None` when no calibration ran this cycle
    pub calibration_accepted: Option<bool>,
    /// Speed of sound applied (m/s)
    pub speed_of_sound_m_per_s: f32,
    /// Whether the estimate is calibrated
    pub estimate_source: EstimateSource,
}

/// Anything the device publishes
///
/// The uplink encodes the inner payload. The variant only selects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    /// One buffered measurement
    Reading(ReadingPayload),
    /// Node health for the system topic
    Health(HealthReport),
    /// Free-form text for the test topic
    Diagnostic(&'static str),
}

impl Message {
    /// Topic this message belongs on
    pub fn default_topic(&self) -> Topic {
        match self {
            Self::Reading(_) => Topic::Readings,
            Self::Health(_) => Topic::System,
            Self::Diagnostic(_) => Topic::Test,
        }
    }
}

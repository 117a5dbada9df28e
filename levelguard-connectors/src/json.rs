//! JSON payload codec
//!
//! One message, one JSON document:
//!
//! | Message      | Body                                                    |
//! |--------------|---------------------------------------------------------|
//! | `Reading`    | object with the eight reading fields                    |
//! | `Health`     | object with the health report fields                    |
//! | `Diagnostic` | the bare string                                         |
//!
//! A failed measurement encodes `"distance_m": null`. Non-finite numbers
//! have no JSON form and are refused instead of being sent as `null`.

use levelguard_core::telemetry::{HealthReport, Message, ReadingPayload};

use crate::ConnectorError;

/// Encode a message body
pub fn encode(message: &Message) -> Result<Vec<u8>, ConnectorError> {
    match message {
        Message::Reading(reading) => {
            check_finite(&[
                reading.speed_of_sound_m_per_s,
                reading.temperature_c,
                reading.humidity_pct,
                reading.pressure_kpa,
            ])?;
            if let Some(d) = reading.distance_m {
                check_finite(&[d])?;
            }
            to_vec(reading)
        }
        Message::Health(health) => {
            check_finite(&[health.speed_of_sound_m_per_s])?;
            to_vec(health)
        }
        Message::Diagnostic(text) => to_vec(text),
    }
}

/// Decode a readings-topic body
pub fn decode_reading(bytes: &[u8]) -> Result<ReadingPayload, ConnectorError> {
    serde_json::from_slice(bytes).map_err(|e| ConnectorError::Encoding(e.to_string()))
}

/// Decode a system-topic body
pub fn decode_health(bytes: &[u8]) -> Result<HealthReport, ConnectorError> {
    serde_json::from_slice(bytes).map_err(|e| ConnectorError::Encoding(e.to_string()))
}

fn to_vec<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ConnectorError> {
    serde_json::to_vec(value).map_err(|e| ConnectorError::Encoding(e.to_string()))
}

fn check_finite(values: &[f32]) -> Result<(), ConnectorError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ConnectorError::Encoding("non-finite value".into()))
    }
}

//! Telemetry Uplinks for LevelGuard Nodes
//!
//! ## Overview
//!
//! The core pipeline publishes [`Message`]s on three logical
//! [`Topic`]s through the `TelemetryUplink` trait and does not care how
//! they travel. This crate supplies the "how" for hosted gateways and
//! bench setups:
//!
//! ```text
//!  Device ──▶ JsonUplink ──encode──▶ Connector ──▶ broker
//!              │   topic name          (MQTT)
//!              └── stats
//! ```
//!
//! - [`json`]: payload encoding, one JSON document per message
//! - [`TopicNames`]: logical topic → broker topic string
//! - [`JsonUplink`]: adapts any [`Connector`] to `TelemetryUplink`
//! - [`mqtt`]: `rumqttc` connector that waits for the broker's PUBACK
//!
//! ## Delivery Semantics
//!
//! A publish succeeds only once the transport confirms it. Every other
//! outcome (timeout, refusal, dropped link) is a failure, and the device
//! keeps the reading buffered for the next wake.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use levelguard_connectors::mqtt::{MqttConfig, MqttConnector};
//! use levelguard_connectors::{JsonUplink, TopicNames};
//!
//! let config = MqttConfig::new("mqtt.tago.io", 1883, "MQTT_1")
//!     .credentials("username", "password")
//!     .ack_timeout_secs(20);
//! let connector = MqttConnector::connect(config)?;
//! let uplink = JsonUplink::new(connector, TopicNames::default());
//! # Ok::<(), levelguard_connectors::ConnectorError>(())
//! ```

pub mod json;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnector};

use levelguard_core::errors::UplinkError;
use levelguard_core::telemetry::{Message, Topic};
use levelguard_core::traits::TelemetryUplink;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Timeout")]
    Timeout,

    #[error("Rejected by broker: {0}")]
    Rejected(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConnectorError> for UplinkError {
    fn from(error: ConnectorError) -> Self {
        match error {
            ConnectorError::NotConnected => UplinkError::NotConnected,
            ConnectorError::Timeout => UplinkError::Timeout,
            ConnectorError::Rejected(_) => UplinkError::Rejected { reason: "broker refused publish" },
            ConnectorError::Encoding(_) => UplinkError::Encoding,
            ConnectorError::Config(_) => UplinkError::Rejected { reason: "connector misconfigured" },
        }
    }
}

/// Byte-level transport to a broker
pub trait Connector {
    /// Send `data` on `topic` and wait for the transport's confirmation
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}

/// Broker topic for each logical topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNames {
    pub system: String,
    pub readings: String,
    pub test: String,
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            system: Topic::System.name().to_string(),
            readings: Topic::Readings.name().to_string(),
            test: Topic::Test.name().to_string(),
        }
    }
}

impl TopicNames {
    /// Default names under `prefix/`, e.g. `tanks/07/readings`
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let scoped = |topic: Topic| format!("{}/{}", prefix, topic.name());
        Self {
            system: scoped(Topic::System),
            readings: scoped(Topic::Readings),
            test: scoped(Topic::Test),
        }
    }

    /// Broker topic for `topic`
    pub fn resolve(&self, topic: Topic) -> &str {
        match topic {
            Topic::System => &self.system,
            Topic::Readings => &self.readings,
            Topic::Test => &self.test,
        }
    }
}

/// [`TelemetryUplink`] that JSON-encodes messages onto a [`Connector`]
pub struct JsonUplink<C> {
    connector: C,
    topics: TopicNames,
    stats: ConnectionStats,
}

impl<C: Connector> JsonUplink<C> {
    pub fn new(connector: C, topics: TopicNames) -> Self {
        Self {
            connector,
            topics,
            stats: ConnectionStats::default(),
        }
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub fn topics(&self) -> &TopicNames {
        &self.topics
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn into_inner(self) -> C {
        self.connector
    }

    fn record_failure(&mut self, topic: &str, error: &ConnectorError) {
        self.stats.messages_failed += 1;
        self.stats.last_error = Some(error.to_string());
        log::warn!("Publish to {} failed: {}", topic, error);
    }
}

impl<C: Connector> TelemetryUplink for JsonUplink<C> {
    fn publish(&mut self, topic: Topic, message: &Message) -> Result<(), UplinkError> {
        let name = self.topics.resolve(topic).to_string();

        let payload = match json::encode(message) {
            Ok(payload) => payload,
            Err(e) => {
                self.record_failure(&name, &e);
                return Err(e.into());
            }
        };

        match self.connector.send(&name, &payload) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += payload.len() as u64;
                log::debug!("Published {} bytes to {}", payload.len(), name);
                Ok(())
            }
            Err(e) => {
                self.record_failure(&name, &e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelguard_core::telemetry::ReadingPayload;

    #[derive(Default)]
    struct MockConnector {
        sent: Vec<(String, Vec<u8>)>,
        fail: Option<ConnectorError>,
    }

    impl Connector for MockConnector {
        fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
            if let Some(e) = &self.fail {
                return Err(e.clone());
            }
            self.sent.push((topic.to_string(), data.to_vec()));
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.fail.is_none()
        }
    }

    fn reading() -> Message {
        Message::Reading(ReadingPayload {
            distance_m: Some(1.42),
            timestamp_ms: 1_700_000_000_000,
            valid_samples: 9,
            rejected_samples: 1,
            speed_of_sound_m_per_s: 343.9,
            temperature_c: 20.0,
            humidity_pct: 50.0,
            pressure_kpa: 101.6,
        })
    }

    #[test]
    fn default_topics_match_deployment() {
        let topics = TopicNames::default();
        assert_eq!(topics.resolve(Topic::System), "syscheck");
        assert_eq!(topics.resolve(Topic::Readings), "readings");
        assert_eq!(topics.resolve(Topic::Test), "t");
    }

    #[test]
    fn prefixed_topics() {
        let topics = TopicNames::with_prefix("tanks/07/");
        assert_eq!(topics.resolve(Topic::Readings), "tanks/07/readings");
        assert_eq!(topics.resolve(Topic::System), "tanks/07/syscheck");
    }

    #[test]
    fn publish_routes_and_counts() {
        let mut uplink = JsonUplink::new(MockConnector::default(), TopicNames::default());
        uplink.publish(Topic::Readings, &reading()).unwrap();

        let (topic, payload) = &uplink.connector().sent[0];
        assert_eq!(topic, "readings");
        let decoded = json::decode_reading(payload).unwrap();
        assert_eq!(decoded.distance_m, Some(1.42));

        assert_eq!(uplink.stats().messages_sent, 1);
        assert_eq!(uplink.stats().bytes_sent, payload.len() as u64);
    }

    #[test]
    fn transport_errors_become_uplink_failures() {
        let connector = MockConnector {
            fail: Some(ConnectorError::Timeout),
            ..Default::default()
        };
        let mut uplink = JsonUplink::new(connector, TopicNames::default());

        assert_eq!(uplink.publish(Topic::System, &reading()), Err(UplinkError::Timeout));
        assert_eq!(uplink.stats().messages_failed, 1);
        assert_eq!(uplink.stats().last_error.as_deref(), Some("Timeout"));
    }

    #[test]
    fn error_mapping() {
        assert_eq!(UplinkError::from(ConnectorError::NotConnected), UplinkError::NotConnected);
        assert_eq!(
            UplinkError::from(ConnectorError::Encoding("nan".into())),
            UplinkError::Encoding
        );
        assert!(matches!(
            UplinkError::from(ConnectorError::Rejected("quota".into())),
            UplinkError::Rejected { .. }
        ));
    }
}

//! MQTT connector for LevelGuard
//!
//! Blocking `rumqttc` client. Every publish is QoS 1 and only counts as
//! delivered once the broker's PUBACK arrives within `ack_timeout`.

use std::time::{Duration, Instant};

use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS, RecvTimeoutError,
};

use crate::{Connector, ConnectorError, JsonUplink};

/// Default broker for field deployments
pub const DEFAULT_HOST: &str = "mqtt.tago.io";
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_CLIENT_ID: &str = "MQTT_1";

/// Smallest keep-alive the client accepts
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Outgoing request queue depth. One publish is in flight at a time.
const REQUEST_CAPACITY: usize = 10;

/// MQTT connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    /// Deadline for CONNACK and for each PUBACK
    pub ack_timeout: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(60),
            ack_timeout: Duration::from_secs(20),
        }
    }
}

impl MqttConfig {
    pub fn new(host: impl Into<String>, port: u16, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    pub fn ack_timeout_secs(mut self, secs: u64) -> Self {
        self.ack_timeout = Duration::from_secs(secs);
        self
    }

    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.host.trim().is_empty() {
            return Err(ConnectorError::Config("broker host is empty".into()));
        }
        if self.port == 0 {
            return Err(ConnectorError::Config("broker port is 0".into()));
        }
        if self.client_id.is_empty() {
            return Err(ConnectorError::Config("client id is empty".into()));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ConnectorError::Config(
                "username and password must be set together".into(),
            ));
        }
        if self.keep_alive.as_secs() < MIN_KEEP_ALIVE_SECS {
            return Err(ConnectorError::Config(format!(
                "keep-alive must be at least {}s",
                MIN_KEEP_ALIVE_SECS
            )));
        }
        if self.ack_timeout.is_zero() {
            return Err(ConnectorError::Config("ack timeout is 0".into()));
        }
        Ok(())
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            options.set_credentials(user.clone(), pass.clone());
        }
        options
    }
}

/// Blocking MQTT connector
pub struct MqttConnector {
    client: Client,
    connection: Connection,
    config: MqttConfig,
    connected: bool,
}

/// Uplink a device can own directly
pub type MqttUplink = JsonUplink<MqttConnector>;

impl MqttConnector {
    /// Open the session and wait for the broker's CONNACK
    pub fn connect(config: MqttConfig) -> Result<Self, ConnectorError> {
        config.validate()?;
        let (client, connection) = Client::new(config.options(), REQUEST_CAPACITY);
        let mut connector = Self {
            client,
            connection,
            config,
            connected: false,
        };
        connector.await_connack()?;
        log::info!(
            "MQTT connected to {}:{} as {}",
            connector.config.host,
            connector.config.port,
            connector.config.client_id
        );
        Ok(connector)
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    /// Send DISCONNECT and drop the session
    pub fn disconnect(mut self) {
        if let Err(e) = self.client.disconnect() {
            log::warn!("MQTT disconnect failed: {}", e);
        }
        self.connected = false;
    }

    fn await_connack(&mut self) -> Result<(), ConnectorError> {
        let timeout = self.config.ack_timeout;
        self.wait_for(timeout, |packet| match packet {
            Packet::ConnAck(ack) if ack.code == ConnectReturnCode::Success => Some(Ok(())),
            Packet::ConnAck(ack) => Some(Err(ConnectorError::Rejected(format!("{:?}", ack.code)))),
            _ => None,
        })?;
        self.connected = true;
        Ok(())
    }

    fn await_puback(&mut self) -> Result<(), ConnectorError> {
        let timeout = self.config.ack_timeout;
        self.wait_for(timeout, |packet| match packet {
            Packet::PubAck(_) => Some(Ok(())),
            Packet::Disconnect => Some(Err(ConnectorError::NotConnected)),
            _ => None,
        })
    }

    /// Drive the event loop until `accept` decides or `timeout` elapses
    fn wait_for<F>(&mut self, timeout: Duration, mut accept: F) -> Result<(), ConnectorError>
    where
        F: FnMut(&Packet) -> Option<Result<(), ConnectorError>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ConnectorError::Timeout);
            }

            match self.connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(packet))) => {
                    if let Some(result) = accept(&packet) {
                        if matches!(result, Err(ConnectorError::NotConnected)) {
                            self.connected = false;
                        }
                        return result;
                    }
                }
                Ok(Ok(Event::Outgoing(_))) => {}
                Ok(Err(e)) => {
                    log::warn!("MQTT connection error: {}", e);
                    self.connected = false;
                    return Err(ConnectorError::NotConnected);
                }
                Err(RecvTimeoutError::Timeout) => return Err(ConnectorError::Timeout),
                Err(RecvTimeoutError::Disconnected) => {
                    self.connected = false;
                    return Err(ConnectorError::NotConnected);
                }
            }
        }
    }
}

impl Connector for MqttConnector {
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        if !self.connected {
            // The event loop reconnects on the next poll
            self.await_connack()?;
        }

        self.client
            .publish(topic, QoS::AtLeastOnce, false, data.to_vec())
            .map_err(|e| {
                log::warn!("MQTT publish request failed: {}", e);
                ConnectorError::NotConnected
            })?;

        self.await_puback()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

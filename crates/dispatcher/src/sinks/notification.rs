//! NotificationSink - best-effort pub/sub of the latest readings
//!
//! Each reading is published under `<namespace>/<source_id>` with the value
//! as text. One attempt per reading per tick; failures are reported, never
//! retried.

use contracts::{ContractError, DataSink, Snapshot};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, instrument, warn};

use crate::error::DispatcherError;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "pit_companion";

/// Transport capability for keyed messages
#[trait_variant::make(Publisher: Send)]
pub trait LocalPublisher {
    /// Publish one message
    async fn publish(&mut self, key: &str, payload: &str, retain: bool)
        -> Result<(), ContractError>;

    /// Release the transport
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Configuration for NotificationSink
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationConfig {
    /// Endpoint address (`host:port`)
    pub addr: String,
    /// Key prefix, trailing `/` removed
    pub namespace: String,
    /// Ask the broker to keep the last value
    pub retain: bool,
}

impl NotificationConfig {
    /// Create config from params map
    pub fn from_params(
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        let addr = params
            .get("addr")
            .filter(|a| !a.trim().is_empty())
            .cloned()
            .ok_or_else(|| DispatcherError::invalid_param(name, "addr", "missing parameter"))?;

        let namespace = params
            .get("namespace")
            .map(|ns| ns.trim_end_matches('/').to_string())
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let retain = match params.get("retain").map(String::as_str) {
            None | Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(DispatcherError::invalid_param(
                    name,
                    "retain",
                    format!("expected true or false, got '{other}'"),
                ))
            }
        };

        Ok(Self {
            addr,
            namespace,
            retain,
        })
    }

    /// Key for one source
    pub fn key_for(&self, source_id: &str) -> String {
        format!("{}/{}", self.namespace, source_id)
    }
}

/// Text form of a temperature: `110.0`, `56.7`
pub fn format_payload(value_c: f64) -> String {
    format!("{value_c:?}")
}

/// Publisher sending one UDP datagram per message
///
/// The datagram is `"<key> <payload>"`, with `" retain"` appended when the
/// receiver should keep the message as the last known value of `key`.
pub struct UdpPublisher {
    socket: Option<UdpSocket>,
    target: SocketAddr,
}

impl UdpPublisher {
    /// Resolve `addr` and connect a local socket to it
    #[instrument(name = "udp_publisher_connect")]
    pub async fn connect(addr: &str) -> std::io::Result<Self> {
        let target = lookup_host(addr).await?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address found for '{addr}'"),
            )
        })?;

        let bind = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(target).await?;

        debug!(target = %target, "UdpPublisher connected");

        Ok(Self {
            socket: Some(socket),
            target,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Publisher for UdpPublisher {
    async fn publish(
        &mut self,
        key: &str,
        payload: &str,
        retain: bool,
    ) -> Result<(), ContractError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_connection("udp", "socket closed"))?;

        let datagram = if retain {
            format!("{key} {payload} retain")
        } else {
            format!("{key} {payload}")
        };
        socket
            .send(datagram.as_bytes())
            .await
            .map_err(|e| ContractError::sink_delivery("udp", e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        Ok(())
    }
}

/// Sink that publishes every reading through a [`Publisher`]
pub struct NotificationSink<P> {
    name: String,
    config: NotificationConfig,
    publisher: P,
}

impl<P: Publisher> NotificationSink<P> {
    pub fn new(name: impl Into<String>, config: NotificationConfig, publisher: P) -> Self {
        Self {
            name: name.into(),
            config,
            publisher,
        }
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }
}

impl NotificationSink<UdpPublisher> {
    /// Create from params, connecting the UDP publisher (for factory)
    ///
    /// Parameter errors and connection errors are reported separately so the
    /// caller can degrade only on the latter.
    pub async fn connect(
        name: impl Into<String>,
        config: NotificationConfig,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let publisher = UdpPublisher::connect(&config.addr)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;
        Ok(Self::new(name, config, publisher))
    }
}

impl<P: Publisher> DataSink for NotificationSink<P> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "notification_sink_deliver",
        skip(self, snapshot),
        fields(sink = %self.name, tick = snapshot.tick())
    )]
    async fn deliver(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        let mut failures = Vec::new();

        for (source_id, reading) in snapshot.readings() {
            let key = self.config.key_for(source_id);
            let payload = format_payload(reading.value_c());
            if let Err(e) = self
                .publisher
                .publish(&key, &payload, self.config.retain)
                .await
            {
                warn!(sink = %self.name, key = %key, error = %e, "Publish failed");
                failures.push(key);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContractError::sink_delivery(
                &self.name,
                format!("publish failed for {}", failures.join(", ")),
            ))
        }
    }

    #[instrument(name = "notification_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "notification_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.publisher.close().await?;
        debug!(sink = %self.name, "NotificationSink closed");
        Ok(())
    }
}

//! Configuration types
//!
//! `ConfigValues` is one layer of partially specified settings (a file, the
//! environment, the command line). Layers are merged and then resolved into
//! the immutable `RelayConfig` the components run with.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::config::defaults;
use crate::tls::{TlsOptions, TlsVersion};

/// One layer of configuration values
///
/// Every field is optional; `None` means "not set by this source".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigValues {
    // --- Network settings ---

    /// Remote node host name or address
    pub remote_host: Option<String>,
    /// Remote TLS port
    pub remote_port: Option<u16>,
    /// Local plaintext listener port
    pub local_port: Option<u16>,
    /// Local listener address
    pub listen_host: Option<IpAddr>,

    // --- Relay settings ---

    /// Per-direction copy buffer size in bytes
    pub buffer_size: Option<usize>,
    /// Maximum concurrently relayed connections (0 = unlimited)
    pub max_connections: Option<usize>,
    /// TCP connect plus handshake timeout in seconds (0 = none)
    pub connect_timeout: Option<u64>,
    /// Drain period on shutdown in seconds
    pub shutdown_timeout: Option<u64>,

    // --- TLS settings ---

    /// Highest TLS version offered to the remote
    pub tls_max_version: Option<TlsVersion>,
    /// Verify the remote certificate chain
    pub verify_peer: Option<bool>,
    /// Verify the remote certificate host name
    pub verify_hostname: Option<bool>,

    // --- Notification settings ---

    /// Pub/sub endpoint the decoder subscribes to
    pub notify_endpoint: Option<String>,

    // --- General settings ---

    /// Log level (error, warn, info, debug, trace)
    pub log_level: Option<String>,
}

/// Resolved relay configuration
///
/// Immutable once the relay and decoder start; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayConfig {
    pub remote_host: String,
    pub remote_port: u16,
    pub local_port: u16,
    pub listen_host: IpAddr,
    pub buffer_size: usize,
    pub max_connections: usize,
    pub connect_timeout: u64,
    pub shutdown_timeout: u64,
    pub tls_max_version: TlsVersion,
    pub verify_peer: bool,
    pub verify_hostname: bool,
    pub notify_endpoint: String,
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::resolve(ConfigValues::default())
    }
}

impl RelayConfig {
    /// Fill unset values with defaults
    ///
    /// The local port defaults to one below the remote port, and the notify
    /// endpoint defaults to the local relay port.
    pub fn resolve(values: ConfigValues) -> Self {
        let remote_port = values.remote_port.unwrap_or_else(defaults::remote_port);
        let local_port = values
            .local_port
            .unwrap_or_else(|| defaults::local_port_for(remote_port));

        Self {
            remote_host: values.remote_host.unwrap_or_else(defaults::remote_host),
            remote_port,
            local_port,
            listen_host: values.listen_host.unwrap_or_else(defaults::listen_host),
            buffer_size: values.buffer_size.unwrap_or_else(defaults::buffer_size),
            max_connections: values.max_connections.unwrap_or_else(defaults::max_connections),
            connect_timeout: values.connect_timeout.unwrap_or_else(defaults::connect_timeout),
            shutdown_timeout: values.shutdown_timeout.unwrap_or_else(defaults::shutdown_timeout),
            tls_max_version: values.tls_max_version.unwrap_or_else(defaults::tls_max_version),
            verify_peer: values.verify_peer.unwrap_or(false),
            verify_hostname: values.verify_hostname.unwrap_or(false),
            notify_endpoint: values
                .notify_endpoint
                .unwrap_or_else(|| defaults::notify_endpoint_for(local_port)),
            log_level: values.log_level.unwrap_or_else(defaults::log_level),
        }
    }

    /// Address the plaintext listener binds
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_host, self.local_port)
    }

    /// Remote endpoint as `host:port`
    pub fn remote_addr(&self) -> String {
        format!("{}:{}", self.remote_host, self.remote_port)
    }

    /// Connection permit count; `None` when unlimited
    pub fn max_connections(&self) -> Option<usize> {
        (self.max_connections > 0).then_some(self.max_connections)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout > 0).then(|| Duration::from_secs(self.connect_timeout))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// TLS settings for the upstream connector
    pub fn tls_options(&self) -> TlsOptions {
        TlsOptions {
            max_version: self.tls_max_version,
            verify_peer: self.verify_peer,
            verify_hostname: self.verify_hostname,
        }
    }
}

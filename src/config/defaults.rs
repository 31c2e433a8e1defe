//! Default configuration values
//!
//! Single source of truth for defaults, shared by the loader, the
//! command-line parser and the tests.

use std::net::{IpAddr, Ipv4Addr};

use crate::tls::TlsVersion;

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "ZMQ_TLS_RELAY_";

/// Default remote port (bitcoind ZMQ publisher)
pub const REMOTE_PORT: u16 = 28332;

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Remote host; there is no sensible default, validation rejects it empty
pub fn remote_host() -> String {
    String::new()
}

/// Default remote port
pub fn remote_port() -> u16 {
    REMOTE_PORT
}

/// Local port derived from the remote port (one below it)
pub fn local_port_for(remote_port: u16) -> u16 {
    remote_port.saturating_sub(1)
}

/// Local listener address
pub fn listen_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// Default relay buffer size (4KB)
pub fn buffer_size() -> usize {
    4096
}

/// Maximum concurrently relayed connections
pub fn max_connections() -> usize {
    256
}

/// Default connect timeout in seconds
pub fn connect_timeout() -> u64 {
    30
}

/// How long stop waits for live connections before aborting them, in seconds
pub fn shutdown_timeout() -> u64 {
    5
}

/// TLS version ceiling
pub fn tls_max_version() -> TlsVersion {
    TlsVersion::Tls1_2
}

/// Pub/sub endpoint for a given local relay port
pub fn notify_endpoint_for(local_port: u16) -> String {
    format!("tcp://127.0.0.1:{}", local_port)
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

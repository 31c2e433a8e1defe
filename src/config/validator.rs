//! Configuration validator
//!
//! This module provides functionality for validating configuration.

use log::warn;

use crate::common::{is_loopback_host, RelayError, Result};
use crate::config::types::RelayConfig;

/// Validate the configuration
pub fn validate_config(config: &RelayConfig) -> Result<()> {
    validate_network_settings(config)?;
    validate_relay_settings(config)?;
    validate_tls_settings(config);
    validate_general_settings(config)?;
    Ok(())
}

/// Validate network settings
fn validate_network_settings(config: &RelayConfig) -> Result<()> {
    if config.remote_host.trim().is_empty() {
        return Err(RelayError::Config(
            "remote_host must be set (e.g. node.example.com)".to_string()
        ));
    }

    if config.remote_port == 0 {
        return Err(RelayError::Config("remote_port must be greater than 0".to_string()));
    }

    if config.local_port == 0 {
        return Err(RelayError::Config("local_port must be greater than 0".to_string()));
    }

    // Relaying to ourselves would loop forever
    if config.local_port == config.remote_port && is_loopback_host(&config.remote_host) {
        return Err(RelayError::Config(format!(
            "local_port {} must differ from remote_port when the remote host is local",
            config.local_port
        )));
    }

    if !config.notify_endpoint.starts_with("tcp://") {
        return Err(RelayError::Config(format!(
            "notify_endpoint must be a tcp:// endpoint, got {}",
            config.notify_endpoint
        )));
    }

    Ok(())
}

/// Validate relay settings
fn validate_relay_settings(config: &RelayConfig) -> Result<()> {
    if config.buffer_size == 0 {
        return Err(RelayError::Config("buffer_size must be greater than 0".to_string()));
    }

    if config.max_connections == 0 {
        warn!("max_connections is 0; relayed connections are unbounded");
    }

    Ok(())
}

/// Warn about weak TLS settings; they are allowed, never rejected
fn validate_tls_settings(config: &RelayConfig) {
    if config.verify_hostname && !config.verify_peer {
        warn!("verify_hostname is set without verify_peer; no certificate checks will happen");
    }
}

/// Validate general settings
fn validate_general_settings(config: &RelayConfig) -> Result<()> {
    match config.log_level.to_lowercase().as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
        _ => Err(RelayError::Config(format!(
            "Invalid log level: {}. Valid values are: error, warn, info, debug, trace",
            config.log_level
        ))),
    }
}

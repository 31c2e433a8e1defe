//! Configuration loading functionality
//!
//! Loads configuration layers from JSON files and environment variables.

use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::common::{RelayError, Result};
use crate::config::defaults::ENV_PREFIX;
use crate::config::types::{ConfigValues, RelayConfig};
use crate::config::validator::validate_config;

impl ConfigValues {
    /// Load a configuration layer from a JSON file
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use zmq_tls_relay::config::ConfigValues;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let values = ConfigValues::from_file("config.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!(
                "Failed to read configuration file {}: {}", path.display(), e
            )))?;

        serde_json::from_str(&content)
            .map_err(|e| RelayError::Config(format!(
                "Failed to parse JSON configuration file {}: {}", path.display(), e
            )))
    }

    /// Load a configuration layer from `ZMQ_TLS_RELAY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(format!("{}{}", ENV_PREFIX, name)).ok())
    }

    /// Build a layer from any name lookup (`REMOTE_HOST`, `REMOTE_PORT`, ...)
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            remote_host: get("REMOTE_HOST"),
            remote_port: parse_var(&get, "REMOTE_PORT")?,
            local_port: parse_var(&get, "LOCAL_PORT")?,
            listen_host: parse_var::<IpAddr, _>(&get, "LISTEN_HOST")?,
            buffer_size: parse_var(&get, "BUFFER_SIZE")?,
            max_connections: parse_var(&get, "MAX_CONNECTIONS")?,
            connect_timeout: parse_var(&get, "CONNECT_TIMEOUT")?,
            shutdown_timeout: parse_var(&get, "SHUTDOWN_TIMEOUT")?,
            tls_max_version: parse_var(&get, "TLS_MAX_VERSION")?,
            verify_peer: parse_bool(&get, "VERIFY_PEER")?,
            verify_hostname: parse_bool(&get, "VERIFY_HOSTNAME")?,
            notify_endpoint: get("NOTIFY_ENDPOINT"),
            log_level: get("LOG_LEVEL"),
        })
    }
}

fn parse_var<T, F>(get: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| RelayError::Config(format!(
                "Invalid value for {}{}: {} ({})", ENV_PREFIX, name, raw, e
            )))
        })
        .transpose()
}

fn parse_bool<F>(get: &F, name: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(RelayError::Config(format!(
                "Invalid value for {}{}: {} (expected true or false)", ENV_PREFIX, name, raw
            ))),
        })
        .transpose()
}

/// Load and validate the relay configuration
///
/// Priority, lowest to highest: defaults, `config_file`, environment,
/// `overrides` (usually the command line).
pub fn load_config(config_file: Option<&Path>, overrides: ConfigValues) -> Result<RelayConfig> {
    let config = resolve_config(config_file, overrides)?;
    validate_config(&config)?;
    Ok(config)
}

/// Layer every source into a [`RelayConfig`] without validating it
///
/// Lets the caller set up logging from the resolved level before
/// [`validate_config`] reports anything.
pub fn resolve_config(config_file: Option<&Path>, overrides: ConfigValues) -> Result<RelayConfig> {
    let mut values = ConfigValues::default();

    if let Some(path) = config_file {
        info!("Loading configuration from file: {}", path.display());
        values = values.merge(ConfigValues::from_file(path)?);
    }

    let env_values = ConfigValues::from_env()?;
    if env_values != ConfigValues::default() {
        debug!("Applying configuration from environment variables");
    }
    values = values.merge(env_values).merge(overrides);

    Ok(RelayConfig::resolve(values))
}

//! ZMQ TLS Relay command line tool
//!
//! Runs the local TLS relay and the notification decoder until Ctrl+C.

use clap::Parser;
use log::{error, info, warn};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use zmq_tls_relay::common::init_logger;
use zmq_tls_relay::config::{resolve_config, validate_config, ConfigValues};
use zmq_tls_relay::notify::{Decoder, ZmqSource};
use zmq_tls_relay::{Relay, RelayError, RelayState, Result, TlsConnector, TlsVersion, APP_NAME, VERSION};

/// Relay a remote node's TLS-wrapped ZMQ feed to a local port and decode it
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Remote node host name or address
    #[clap(long)]
    remote_host: Option<String>,

    /// Remote TLS port [default: 28332]
    #[clap(long)]
    remote_port: Option<u16>,

    /// Local plaintext port [default: remote port - 1]
    #[clap(long)]
    local_port: Option<u16>,

    /// Local listen address [default: 127.0.0.1]
    #[clap(long)]
    listen_host: Option<IpAddr>,

    /// Relay buffer size in bytes [default: 4096]
    #[clap(long)]
    buffer_size: Option<usize>,

    /// Maximum concurrently relayed connections, 0 for unlimited [default: 256]
    #[clap(long)]
    max_connections: Option<usize>,

    /// Upstream connect timeout in seconds, 0 for none [default: 30]
    #[clap(long)]
    connect_timeout: Option<u64>,

    /// Seconds to wait for open connections on shutdown [default: 5]
    #[clap(long)]
    shutdown_timeout: Option<u64>,

    /// Highest TLS version offered to the remote (1.0, 1.1, 1.2, 1.3) [default: 1.2]
    #[clap(long)]
    tls_max_version: Option<TlsVersion>,

    /// Verify the remote certificate chain (`--verify-peer=false` turns it off)
    #[clap(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    verify_peer: Option<bool>,

    /// Verify the remote certificate host name (`--verify-hostname=false` turns it off)
    #[clap(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    verify_hostname: Option<bool>,

    /// ZMQ endpoint to subscribe to [default: tcp://127.0.0.1:<local port>]
    #[clap(long)]
    notify_endpoint: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long)]
    log_level: Option<String>,

    /// Load configuration from a JSON file
    #[clap(long, env = "ZMQ_TLS_RELAY_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Run the relay only, without subscribing to the feed
    #[clap(long)]
    no_decoder: bool,
}

impl Args {
    /// Command-line layer; unset flags leave lower layers untouched
    fn to_values(&self) -> ConfigValues {
        ConfigValues {
            remote_host: self.remote_host.clone(),
            remote_port: self.remote_port,
            local_port: self.local_port,
            listen_host: self.listen_host,
            buffer_size: self.buffer_size,
            max_connections: self.max_connections,
            connect_timeout: self.connect_timeout,
            shutdown_timeout: self.shutdown_timeout,
            tls_max_version: self.tls_max_version,
            verify_peer: self.verify_peer,
            verify_hostname: self.verify_hostname,
            notify_endpoint: self.notify_endpoint.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(args.config_file.as_deref(), args.to_values())?;
    init_logger(&config.log_level);
    info!("Starting {} v{}", APP_NAME, VERSION);

    validate_config(&config)?;
    let config = Arc::new(config);
    info!("Remote node: {} (TLS up to {})", config.remote_addr(), config.tls_max_version);

    let connector = TlsConnector::new(config.tls_options())?
        .with_connect_timeout(config.connect_timeout());
    let state = Arc::new(RelayState::new());

    let relay = Relay::bind(Arc::clone(&config), connector, Arc::clone(&state))?;
    let relay_task = tokio::spawn(relay.run());

    let decoder_task = if args.no_decoder {
        None
    } else {
        match ZmqSource::connect(&config.notify_endpoint).await {
            Ok(source) => Some(tokio::spawn(Decoder::new(source, Arc::clone(&state)).run())),
            Err(e) => {
                error!("Unable to subscribe to {}: {}", config.notify_endpoint, e);
                state.stop();
                let _ = relay_task.await;
                return Err(e);
            }
        }
    };

    info!("Relay ready, press Ctrl+C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl+C: {}", e);
    }

    info!("Shutting down...");
    state.stop();

    if let Some(task) = decoder_task {
        if let Err(e) = task.await {
            error!("Decoder task failed: {}", e);
        }
    }
    relay_task
        .await
        .map_err(|e| RelayError::Other(format!("relay task failed: {}", e)))??;

    info!("Shutdown complete.");
    Ok(())
}

//! Connection handler module
//!
//! This module handles individual client connections: dial the upstream,
//! then hand both streams to the forwarder.

use log::{debug, info};
use metrics::counter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use super::forwarder::proxy_data;
use crate::common::{RelayState, Result};
use crate::config::RelayConfig;
use crate::tls::TlsConnector;

/// Handle a single client connection
///
/// If the upstream cannot be reached the client stream is dropped, which
/// closes it, and the failure is returned for logging.
///
/// # Parameters
///
/// * `client_stream` - Accepted client TCP stream
/// * `client_addr` - Client address, for logging
/// * `connector` - Upstream TLS connector
/// * `config` - Relay configuration
/// * `state` - Relay run state
pub async fn handle_connection(
    client_stream: TcpStream,
    client_addr: SocketAddr,
    connector: Arc<TlsConnector>,
    config: Arc<RelayConfig>,
    state: Arc<RelayState>,
) -> Result<()> {
    if let Err(e) = client_stream.set_nodelay(true) {
        debug!("Unable to set TCP_NODELAY for {}: {}", client_addr, e);
    }

    let connect = connector.connect(&config.remote_host, config.remote_port);
    let upstream = tokio::select! {
        biased;
        _ = state.token().cancelled() => {
            debug!("Relay stopped before upstream for {} was ready", client_addr);
            return Ok(());
        }
        result = connect => match result {
            Ok(stream) => stream,
            Err(e) => {
                counter!("relay.connections.failed").increment(1);
                drop(client_stream);
                return Err(e);
            }
        },
    };

    debug!("Relaying {} <-> {}", client_addr, config.remote_addr());

    let stats = proxy_data(client_stream, upstream, config.buffer_size, state).await?;
    info!(
        "Connection from {} closed ({} bytes sent, {} bytes received)",
        client_addr, stats.upstream, stats.downstream
    );

    Ok(())
}

//! Relay server module
//!
//! Accepts plaintext connections on the local listener and spawns one
//! forwarding unit per connection.

use log::{debug, error, info, warn};
use metrics::counter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;

use super::handler::handle_connection;
use crate::common::{create_listener, RelayError, RelayState, Result};
use crate::config::RelayConfig;
use crate::tls::TlsConnector;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Relay server
///
/// Created in the listening state by [`Relay::bind`]; [`Relay::run`] drives
/// the accept loop until the shared [`RelayState`] is stopped.
pub struct Relay {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<RelayConfig>,
    connector: Arc<TlsConnector>,
    state: Arc<RelayState>,
    /// Connection permits (None = unlimited)
    conn_limit: Option<Arc<Semaphore>>,
}

impl Relay {
    /// Bind the local listener
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Failure to bind is fatal: the relay is not created.
    pub fn bind(
        config: Arc<RelayConfig>,
        connector: TlsConnector,
        state: Arc<RelayState>,
    ) -> Result<Self> {
        let listen_addr = config.listen_addr();
        let listener = create_listener(listen_addr).map_err(|e| {
            RelayError::Config(format!("Failed to bind {}: {}", listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        let conn_limit = config.max_connections().map(|n| {
            info!("max_connections set to {}", n);
            Arc::new(Semaphore::new(n))
        });

        info!("Listening on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            config,
            connector: Arc::new(connector),
            state,
            conn_limit,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run state; calling `stop` on it stops the relay
    pub fn state(&self) -> Arc<RelayState> {
        Arc::clone(&self.state)
    }

    /// Accept connections until stopped, then drain live connections
    ///
    /// Accept errors are logged and the loop continues.
    pub async fn run(self) -> Result<()> {
        let Relay {
            listener,
            local_addr,
            config,
            connector,
            state,
            conn_limit,
        } = self;

        info!("Relaying {} -> {} over TLS", local_addr, config.remote_addr());

        let shutdown = state.token().clone();
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        while state.is_running() {
            while let Some(result) = tasks.try_join_next() {
                log_task_result(result);
            }

            // Wait for a free slot before accepting; excess clients queue in the backlog
            let permit: Option<OwnedSemaphorePermit> = match &conn_limit {
                Some(sem) => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    permit = Arc::clone(sem).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((client_stream, client_addr)) => {
                    info!("Accepted connection from {}", client_addr);
                    counter!("relay.connections.accepted").increment(1);

                    let connector = Arc::clone(&connector);
                    let config = Arc::clone(&config);
                    let state = Arc::clone(&state);

                    tasks.spawn(async move {
                        let _permit = permit;
                        handle_connection(client_stream, client_addr, connector, config, state).await
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }

        drop(listener);
        info!("Relay on {} stopped accepting connections", local_addr);
        drain(tasks, config.shutdown_timeout()).await;
        info!("Relay stopped");
        Ok(())
    }
}

/// Wait for forwarding units to finish, aborting whatever outlives `limit`
async fn drain(mut tasks: JoinSet<Result<()>>, limit: Duration) {
    if tasks.is_empty() {
        return;
    }

    debug!("Waiting up to {:?} for {} connection(s) to close", limit, tasks.len());
    let drained = timeout(limit, async {
        while let Some(result) = tasks.join_next().await {
            log_task_result(result);
        }
    })
    .await;

    if drained.is_err() {
        warn!("Aborting {} connection(s) still open after {:?}", tasks.len(), limit);
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

fn log_task_result(result: std::result::Result<Result<()>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Error handling client: {}", e),
        Err(e) if e.is_cancelled() => debug!("Connection task aborted"),
        Err(e) => error!("Task error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValues;
    use crate::tls::TlsOptions;

    fn test_config(max_connections: usize) -> Arc<RelayConfig> {
        Arc::new(RelayConfig::resolve(ConfigValues {
            remote_host: Some("127.0.0.1".to_string()),
            remote_port: Some(1),
            local_port: Some(0),
            max_connections: Some(max_connections),
            shutdown_timeout: Some(1),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let connector = TlsConnector::new(TlsOptions::default()).unwrap();
        let relay = Relay::bind(test_config(4), connector, Arc::new(RelayState::new())).unwrap();
        assert_ne!(relay.local_addr().port(), 0);
        assert!(relay.conn_limit.is_some());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = Arc::new(RelayConfig::resolve(ConfigValues {
            remote_host: Some("127.0.0.1".to_string()),
            local_port: Some(port),
            ..Default::default()
        }));
        let connector = TlsConnector::new(TlsOptions::default()).unwrap();
        let result = Relay::bind(config, connector, Arc::new(RelayState::new()));
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_returns_after_stop() {
        let connector = TlsConnector::new(TlsOptions::default()).unwrap();
        let relay = Relay::bind(test_config(0), connector, Arc::new(RelayState::new())).unwrap();
        let state = relay.state();
        let running = tokio::spawn(relay.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        state.stop();
        state.stop();

        timeout(Duration::from_secs(5), running).await.unwrap().unwrap().unwrap();
    }
}

//! Data forwarding module
//!
//! Copies bytes in both directions between the client and the upstream.
//! Each direction runs in its own task. The two tasks share a pair token:
//! whichever direction ends first cancels it, which stops the other one.
//! Both streams are then reassembled and shut down exactly once.

use log::{debug, error};
use metrics::counter;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::common::{RelayError, RelayState, Result};

/// Byte totals of one relayed connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Client to upstream
    pub upstream: u64,
    /// Upstream to client
    pub downstream: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upstream,
    Downstream,
}

impl Direction {
    fn metric(self) -> &'static str {
        match self {
            Self::Upstream => "relay.bytes.upstream",
            Self::Downstream => "relay.bytes.downstream",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "client -> upstream"),
            Self::Downstream => write!(f, "upstream -> client"),
        }
    }
}

/// One finished direction, handing its halves back for teardown
struct Transfer<R, W> {
    reader: R,
    writer: W,
    bytes: u64,
}

/// Forward data between two streams until either side closes or the relay stops
///
/// # Parameters
///
/// * `client` - Accepted plaintext stream
/// * `upstream` - Encrypted stream to the remote
/// * `buffer_size` - Read buffer size per direction
/// * `state` - Relay run state
///
/// # Returns
///
/// Returns the bytes copied in each direction, or an error if a forwarding
/// task panicked.
pub async fn proxy_data<C, U>(
    client: C,
    upstream: U,
    buffer_size: usize,
    state: Arc<RelayState>,
) -> Result<TransferStats>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    U: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (client_reader, client_writer) = tokio::io::split(client);
    let (upstream_reader, upstream_writer) = tokio::io::split(upstream);
    let pair = state.child_token();

    let to_upstream = tokio::spawn(copy_direction(
        client_reader,
        upstream_writer,
        buffer_size,
        Arc::clone(&state),
        pair.clone(),
        Direction::Upstream,
    ));
    let to_client = tokio::spawn(copy_direction(
        upstream_reader,
        client_writer,
        buffer_size,
        state,
        pair,
        Direction::Downstream,
    ));

    let (up, down) = tokio::join!(to_upstream, to_client);
    match (up, down) {
        (Ok(up), Ok(down)) => {
            let mut client = up.reader.unsplit(down.writer);
            let mut upstream = down.reader.unsplit(up.writer);

            if let Err(e) = upstream.shutdown().await {
                debug!("Upstream shutdown: {}", e);
            }
            if let Err(e) = client.shutdown().await {
                debug!("Client shutdown: {}", e);
            }

            Ok(TransferStats {
                upstream: up.bytes,
                downstream: down.bytes,
            })
        }
        // A panicked direction already dropped its halves; dropping the
        // survivor's halves closes the rest
        (up, down) => {
            let failure = up.err().or(down.err()).map(|e| e.to_string()).unwrap_or_default();
            error!("Forwarding task failed: {}", failure);
            Err(RelayError::Other(format!("forwarding task failed: {}", failure)))
        }
    }
}

async fn copy_direction<R, W>(
    mut reader: R,
    mut writer: W,
    buffer_size: usize,
    state: Arc<RelayState>,
    pair: CancellationToken,
    direction: Direction,
) -> Transfer<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut total_bytes = 0u64;

    while state.is_running() {
        let n = tokio::select! {
            biased;
            _ = pair.cancelled() => break,
            result = reader.read(&mut buffer) => match result {
                Ok(0) => {
                    debug!("{}: end of stream", direction);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!("{}: read error: {}", direction, e);
                    break;
                }
            },
        };

        let written = tokio::select! {
            biased;
            _ = pair.cancelled() => break,
            result = async {
                writer.write_all(&buffer[..n]).await?;
                writer.flush().await
            } => result,
        };
        if let Err(e) = written {
            debug!("{}: write error: {}", direction, e);
            break;
        }

        total_bytes += n as u64;
        counter!(direction.metric()).increment(n as u64);
    }

    pair.cancel();
    debug!("{} transferred {} bytes total", direction, total_bytes);

    Transfer {
        reader,
        writer,
        bytes: total_bytes,
    }
}

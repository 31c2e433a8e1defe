//! Notification transports
//!
//! The decoder reads from any [`FrameSource`]. [`ZmqSource`] subscribes to
//! a ZMQ publisher; tests and embedders can supply their own source.

use bytes::Bytes;
use futures::future::BoxFuture;
use log::{debug, info};
use tokio::sync::mpsc;
use zeromq::{Socket, SocketRecv, SubSocket};

use super::topic::Topic;
use crate::common::{RelayError, Result};

/// A stream of multi-part messages
pub trait FrameSource: Send {
    /// Receive the next message as its parts
    ///
    /// Must be cancel safe: the decoder drops this future on stop.
    fn recv(&mut self) -> BoxFuture<'_, Result<Vec<Bytes>>>;

    /// Release the transport; later `recv` calls fail
    fn close(&mut self) -> BoxFuture<'_, ()>;
}

/// ZMQ subscriber for the node's notification topics
pub struct ZmqSource {
    endpoint: String,
    socket: Option<SubSocket>,
}

impl ZmqSource {
    /// Connect to `endpoint` and subscribe to every topic in [`Topic::ALL`]
    pub async fn connect(endpoint: &str) -> Result<Self> {
        info!("Connecting to: {}", endpoint);

        let mut socket = SubSocket::new();
        socket.connect(endpoint).await?;
        for topic in Topic::ALL {
            socket.subscribe(topic.name()).await?;
            debug!("Subscribed to {}", topic);
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            socket: Some(socket),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl FrameSource for ZmqSource {
    fn recv(&mut self) -> BoxFuture<'_, Result<Vec<Bytes>>> {
        Box::pin(async move {
            let socket = self
                .socket
                .as_mut()
                .ok_or_else(|| RelayError::Notify("subscription is closed".to_string()))?;
            let message = socket.recv().await?;
            Ok(message.into_vec())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Some(socket) = self.socket.take() {
                for e in socket.close().await {
                    debug!("Error closing subscription to {}: {}", self.endpoint, e);
                }
                info!("Closed subscription to {}", self.endpoint);
            }
        })
    }
}

/// In-process source fed through a channel
///
/// A closed channel is reported as a transport error on every `recv`.
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<Vec<Bytes>>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it
    pub fn new() -> (mpsc::UnboundedSender<Vec<Bytes>>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }
}

impl FrameSource for ChannelSource {
    fn recv(&mut self) -> BoxFuture<'_, Result<Vec<Bytes>>> {
        Box::pin(async move {
            self.receiver
                .recv()
                .await
                .ok_or_else(|| RelayError::Notify("frame channel closed".to_string()))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.receiver.close();
        })
    }
}

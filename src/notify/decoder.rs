//! Notification decoder loop
//!
//! Receives one frame at a time, decodes it by topic and logs the result.
//! Frames are handled strictly in arrival order. A bad frame or a failed
//! receive is logged and the loop moves on to the next receive.

use log::{info, warn};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::frame::{decode_frame, Notification, NotificationFrame};
use super::source::FrameSource;
use crate::common::{RelayError, RelayState, Result};

/// Pause after a transport error so a dead socket does not spin the loop
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Frame counters of one decoder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub decoded: u64,
    pub failed: u64,
}

/// Notification decoder
pub struct Decoder<S> {
    source: S,
    state: Arc<RelayState>,
    sink: Option<mpsc::UnboundedSender<Notification>>,
}

impl<S: FrameSource> Decoder<S> {
    pub fn new(source: S, state: Arc<RelayState>) -> Self {
        Self {
            source,
            state,
            sink: None,
        }
    }

    /// Also forward every decoded notification to `sink`
    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<Notification>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run state; calling `stop` on it stops the decoder
    pub fn state(&self) -> Arc<RelayState> {
        Arc::clone(&self.state)
    }

    /// Receive and decode until stopped, then close the source
    pub async fn run(mut self) -> DecoderStats {
        let shutdown = self.state.token().clone();
        let mut stats = DecoderStats::default();

        while self.state.is_running() {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.source.recv() => received,
            };

            match self.handle(received) {
                Ok(notification) => {
                    stats.decoded += 1;
                    counter!("notify.frames.decoded").increment(1);
                    info!("{}", notification);

                    if let Some(sink) = &self.sink {
                        // A dropped receiver only loses the copy, not the log line
                        let _ = sink.send(notification);
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    counter!("notify.frames.failed").increment(1);

                    if let RelayError::Decode(e) = e {
                        warn!("Skipping frame: {}", e);
                    } else {
                        warn!("Error receiving message: {}", e);
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(RECV_ERROR_BACKOFF) => {}
                        }
                    }
                }
            }
        }

        self.source.close().await;
        info!(
            "Notification decoder stopped ({} decoded, {} failed)",
            stats.decoded, stats.failed
        );
        stats
    }

    fn handle(&self, received: Result<Vec<bytes::Bytes>>) -> Result<Notification> {
        let frame = NotificationFrame::from_parts(received?)?;
        Ok(decode_frame(&frame)?)
    }
}

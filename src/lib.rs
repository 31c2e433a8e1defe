//! ZMQ TLS Relay: local access to a remote node's notification feed
//!
//! Remote blockchain nodes often publish their ZMQ notifications behind a
//! TLS terminator. This library provides the two pieces needed to consume
//! such a feed locally:
//!
//! - a connection relay that accepts plaintext TCP clients on a local port
//!   and forwards each one to the remote node over its own TLS connection
//! - a notification decoder that subscribes to the relayed feed and decodes
//!   `hashblock`, `hashtx`, `rawblock`, `rawtx` and `sequence` messages
//!
//! Both components share one [`RelayState`]; stopping it stops both.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zmq_tls_relay::config::{ConfigValues, RelayConfig};
//! use zmq_tls_relay::notify::{Decoder, ZmqSource};
//! use zmq_tls_relay::{Relay, RelayState, Result, TlsConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Arc::new(RelayConfig::resolve(ConfigValues {
//!         remote_host: Some("node.example.com".to_string()),
//!         ..Default::default()
//!     }));
//!     let state = Arc::new(RelayState::new());
//!
//!     let connector = TlsConnector::new(config.tls_options())?;
//!     let relay = Relay::bind(Arc::clone(&config), connector, Arc::clone(&state))?;
//!     let relay_task = tokio::spawn(relay.run());
//!
//!     let source = ZmqSource::connect(&config.notify_endpoint).await?;
//!     let decoder_task = tokio::spawn(Decoder::new(source, Arc::clone(&state)).run());
//!
//!     tokio::signal::ctrl_c().await?;
//!     state.stop();
//!     let _ = relay_task.await;
//!     let _ = decoder_task.await;
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod notify;
pub mod proxy;
pub mod tls;

// Re-export commonly used structures and functions for convenience
pub use common::{RelayError, RelayState, Result};
pub use proxy::Relay;
pub use tls::{TlsConnector, TlsOptions, TlsVersion};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

//! Connection relay module
//!
//! Listens for plaintext clients on the local port and relays each one to
//! the remote node over its own TLS connection.

mod forwarder;
mod handler;
mod server;

pub use forwarder::{proxy_data, TransferStats};
pub use handler::handle_connection;
pub use server::Relay;

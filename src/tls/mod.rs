//! TLS handling module
//!
//! This module owns the outbound TLS client used to reach the remote node.

mod connector;
mod version;

pub use connector::{TlsConnector, TlsOptions, TlsStream};
pub use version::TlsVersion;

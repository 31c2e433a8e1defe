//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use thiserror::Error;
use std::io;

/// Relay error type
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),

    /// TLS handshake error
    #[error("TLS handshake error: {0}")]
    TlsHandshake(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pub/sub transport error
    #[error("Notification transport error: {0}")]
    Notify(String),

    /// Malformed notification frame
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Per-frame decode failures
///
/// These never stop the decoder loop; they are logged and the next frame is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Topic outside the subscribed set
    #[error("unrecognized topic {0:?}")]
    UnknownTopic(String),

    /// The multi-part message did not carry the named part
    #[error("frame is missing its {0} part")]
    MissingPart(&'static str),

    /// The payload is too short for the topic's layout
    #[error("{topic} payload too short: expected at least {expected} bytes, got {actual}")]
    ShortPayload {
        topic: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl From<zeromq::ZmqError> for RelayError {
    fn from(err: zeromq::ZmqError) -> Self {
        RelayError::Notify(err.to_string())
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

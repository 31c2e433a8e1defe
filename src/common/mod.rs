//! Common module
//!
//! This module contains shared errors, run state and utility functions used throughout the application.

pub mod error;
pub mod log;
pub mod net;
pub mod state;

// Re-export commonly used types and functions
pub use self::error::{DecodeError, RelayError, Result};
pub use self::log::{init_logger, logger_builder};
pub use self::net::{create_listener, is_loopback_host, parse_socket_addr};
pub use self::state::RelayState;

//! Configuration module
//!
//! This module handles application configuration: defaults, loading from
//! files and environment variables, layering, and validation.

pub mod defaults;
mod loader;
mod merger;
mod types;
mod validator;

pub use self::defaults::ENV_PREFIX;
pub use self::loader::{load_config, resolve_config};
pub use self::types::{ConfigValues, RelayConfig};
pub use self::validator::validate_config;

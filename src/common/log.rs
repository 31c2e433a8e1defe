//! Logging utilities
//!
//! Thin wrapper around `env_logger` so both binaries and tests initialise
//! logging the same way.

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when it is set.
///
/// # Parameters
///
/// * `level` - Log level
pub fn init_logger(level: &str) {
    // A second initialisation (tests, embedding) is not an error for us
    let _ = logger_builder(level).try_init();
}

/// Logger builder used by [`init_logger`], filtering at `level` unless
/// `RUST_LOG` is set
pub fn logger_builder(level: &str) -> env_logger::Builder {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp_millis();
    builder
}

//! Diagnostic logging setup.
//!
//! Log lines go to stderr so the interactive menu on stdout stays readable.

use crate::error::{Error, Result};

/// Install the global `tracing` subscriber.
///
/// `level` is an `EnvFilter` directive such as `info` or
/// `task_console=debug`. When `verbose` is set the level is raised to
/// `debug` regardless of the configured value.
///
/// # Errors
///
/// Returns [`Error::Config`] if the directive is invalid or a subscriber is
/// already installed.
pub fn init(level: &str, verbose: bool) -> Result<()> {
    let directive = if verbose { "debug" } else { level };

    let filter = tracing_subscriber::EnvFilter::try_new(directive)
        .map_err(|error| Error::Config(format!("invalid log level '{directive}': {error}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| Error::Config(format!("failed to initialize logging: {error}")))?;

    Ok(())
}

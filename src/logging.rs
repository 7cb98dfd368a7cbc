// 📝 Logging - tracing subscriber setup for the binaries
//
// RUST_LOG wins when set; otherwise `plant_linker=<level>` from config.

use crate::config::LoggingConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when RUST_LOG is not set
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("plant_linker={}", config.level.trim().to_lowercase())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive(config))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    // Logs go to stderr so CLI output on stdout stays machine-readable
    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialised");
    }
    Ok(())
}

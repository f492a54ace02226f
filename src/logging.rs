//! Tracing subscriber setup shared by the binaries

use crate::config::{LogFormat, LoggingConfig};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr. `RUST_LOG` directives
/// take precedence; `target` is raised to the configured level on top of them.
pub fn init_logging(config: &LoggingConfig, target: &str) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("{}={}", target, config.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

pub mod config;
pub mod error;

pub use config::{CalendarConfig, Config, PreferencesConfig, ValidationResult, WriterConfig};
pub use error::ConfigError;

use anyhow::Result;

/// Initialize logging for the bridge.
///
/// Respects `RUST_LOG`; defaults to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("calbridge core initialized");
    Ok(())
}

pub mod config;
pub mod error;

pub use config::{Config, DashboardConfig, ProviderConfig, ValidationResult};
pub use error::{
    AppError, ConfigError, PersistenceError, ProviderError, ReqwestErrorExt, RusqliteErrorExt,
    ValidationError,
};

use anyhow::Result;

/// Initialize logging for the process.
///
/// Honors `RUST_LOG`; falls back to `info`. Logs go to stderr so command
/// output on stdout stays clean.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!("Skycast core initialized");
    Ok(())
}

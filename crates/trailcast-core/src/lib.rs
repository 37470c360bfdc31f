//! Core crate for Trailcast: configuration and process initialization.

pub mod config;
pub mod error;

pub use config::{
    CacheConfig, Config, ConditionsConfig, ValidationResult, WeatherConfig,
};
pub use error::ConfigError;

use anyhow::Result;

/// Initialize tracing for the process. Call once from main.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::debug!("Trailcast core initialized");
    Ok(())
}

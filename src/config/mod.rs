//! Configuration management for Renderbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use renderbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Rendering with {} workers", config.pool.concurrency);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `RENDERBOX__<section>__<key>`
//!
//! Examples:
//! - `RENDERBOX__POOL__CONCURRENCY=4`
//! - `RENDERBOX__TIMEOUTS__PAGE_LOAD=15s`
//! - `RENDERBOX__RENDER__OUTPUT_DIR=/tmp/rendered`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/renderbox.toml`.
//! This can be overridden using the `RENDERBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::Millis;
pub use models::{Config, PoolConfig, RenderConfig, TimeoutConfig, ViewportConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`RENDERBOX__*`)
    /// 2. TOML file (default: `config/renderbox.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or the
    /// resulting configuration fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-check invariants after programmatic mutation (CLI overrides)
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[render]
input_dir = "dataset"

[pool]
concurrency = 2
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.pool.concurrency, 2);
    }

    #[test]
    fn test_validation_catches_bad_timeouts() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[timeouts]
page_load = "5s"
screenshot = "10s"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::ScreenshotTimeoutTooLong { .. })
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[render]
input_dir = "dataset"
output_dir = "output"

[pool]
concurrency = 8

[timeouts]
page_load = "30s"
screenshot = "5s"
progress_interval = "250ms"

[viewport]
width = 800
height = 600
device_scale_factor = 0.5
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.pool.concurrency, 8);
        assert_eq!(config.timeouts.progress_interval.as_u64(), 250);
        assert_eq!(config.viewport.device_scale_factor, 0.5);
        assert_eq!(
            config.render.output_file().to_str(),
            Some("output/render_results.json")
        );
    }
}

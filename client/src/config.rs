//! Configuration management for the Battery Health certificate client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BHC_ prefix

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Certificate service configuration
    pub api: ApiConfig,

    /// Batch pacing and limits
    pub batch: BatchConfig,

    /// Where generated certificates are saved
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the certificate service
    pub base_url: String,

    /// Per-request timeout in seconds; unset means wait indefinitely
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    /// Pause between consecutive extraction uploads, in milliseconds
    pub upload_pause_ms: u64,

    /// Pause between consecutive render requests, in milliseconds
    pub generation_pause_ms: u64,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory generated PDFs are written to
    pub directory: PathBuf,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl BatchConfig {
    pub fn upload_pause(&self) -> Duration {
        Duration::from_millis(self.upload_pause_ms)
    }

    pub fn generation_pause(&self) -> Duration {
        Duration::from_millis(self.generation_pause_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BHC_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("api.base_url", "https://bhcg.up.railway.app")?
            .set_default("batch.upload_pause_ms", 300)?
            .set_default("batch.generation_pause_ms", 500)?
            .set_default("batch.max_upload_bytes", shared::MAX_UPLOAD_BYTES)?
            .set_default("output.directory", "certificates")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BHC_ prefix)
            .add_source(
                Environment::with_prefix("BHC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bhcg.up.railway.app".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            upload_pause_ms: 300,
            generation_pause_ms: 500,
            max_upload_bytes: shared::MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("certificates"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            api: ApiConfig::default(),
            batch: BatchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

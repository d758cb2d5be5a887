//! Layered configuration
//!
//! Defaults, then an optional `config/abalone.{toml,yaml,json}` file, then
//! `ABALONE_`-prefixed environment variables (`ABALONE_SERVER__ADDR`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config/abalone";

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

/// Artifact location settings
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSettings {
    /// Application base directory containing `models/`
    pub base_dir: PathBuf,
    /// Model file name inside `models/`; `.onnx` selects the ONNX backend
    pub model_file: String,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Maximum level (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Metrics settings
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

/// Full service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub artifacts: ArtifactSettings,
    pub log: LogSettings,
    pub metrics: MetricsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                addr: "0.0.0.0:8080".to_string(),
            },
            artifacts: ArtifactSettings {
                base_dir: PathBuf::from("."),
                model_file: "model.json".to_string(),
            },
            log: LogSettings {
                level: "info".to_string(),
                json: false,
            },
            metrics: MetricsSettings { enabled: true },
        }
    }
}

impl Settings {
    /// Load from the default file location and the process environment
    pub fn load() -> Result<Self, SettingsError> {
        Self::from_sources(Some(DEFAULT_CONFIG_FILE))
    }

    /// Load from an optional config file and the process environment
    pub fn from_sources(file: Option<&str>) -> Result<Self, SettingsError> {
        Self::build(file, None)
    }

    fn build(
        file: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("server.addr", defaults.server.addr)?
            .set_default(
                "artifacts.base_dir",
                defaults.artifacts.base_dir.to_string_lossy().into_owned(),
            )?
            .set_default("artifacts.model_file", defaults.artifacts.model_file)?
            .set_default("log.level", defaults.log.level)?
            .set_default("log.json", defaults.log.json)?
            .set_default("metrics.enabled", defaults.metrics.enabled)?;

        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("ABALONE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

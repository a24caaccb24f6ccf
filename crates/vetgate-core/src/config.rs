//! Configuration loading for vetgate applications
//!
//! Layered loading: defaults, then a configuration file (TOML, JSON or YAML
//! by extension), then `VETGATE__`-prefixed environment variables. Guardrail
//! pipeline definitions live in `vetgate-guardrails::config`; this module
//! covers the application-level knobs: logging and engine bookkeeping.

use crate::error::{Result, VetgateError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration for a process embedding the validation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Engine bookkeeping settings
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines instead of the pretty format
    #[serde(default)]
    pub json: bool,
}

/// Engine bookkeeping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// How many execution-log entries the engine retains before rotating
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_capacity() -> usize {
    1000
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            log_capacity: default_log_capacity(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            engine: EngineSettings::default(),
        }
    }
}

/// Load configuration from a file, layered with environment overrides
///
/// # Example
///
/// ```no_run
/// use vetgate_core::config::load_config;
///
/// let config = load_config("vetgate.toml").unwrap();
/// println!("log capacity: {}", config.engine.log_capacity);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VetgateError::config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("VETGATE").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;

    tracing::info!("Configuration loaded from {}", path.display());

    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> AppConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.engine.log_capacity, 1000);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.engine.log_capacity, deserialized.engine.log_capacity);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "logging": {
                "level": "debug",
                "json": true
            },
            "engine": {
                "log_capacity": 250
            }
        }"#;

        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.engine.log_capacity, 250);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "logging": { "level": "warn" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.engine.log_capacity, 1000);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default() {
        let config = load_config_or_default("nonexistent.toml");
        assert_eq!(config.logging.level, "info");
    }
}

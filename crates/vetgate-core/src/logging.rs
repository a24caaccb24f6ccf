//! Logging setup for processes embedding the engine
//!
//! Structured logging via `tracing`. The engine itself only emits spans and
//! events; wiring a subscriber is the host application's call, done once at
//! startup through this module.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level when set. Call once
/// at application startup.
///
/// # Example
///
/// ```
/// use vetgate_core::config::LoggingConfig;
/// use vetgate_core::logging::init_logging;
///
/// init_logging(&LoggingConfig {
///     level: "debug".to_string(),
///     json: false,
/// });
/// ```
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        // JSON lines for production log shippers
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Human-readable format for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .init();
    }

    tracing::info!("Logging initialized at level: {}", config.level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_fields() {
        let config = LoggingConfig {
            level: "trace".to_string(),
            json: true,
        };
        assert_eq!(config.level, "trace");
        assert!(config.json);
    }

    #[test]
    fn test_default_logging_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }
}

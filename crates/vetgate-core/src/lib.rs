//! Vetgate Core
//!
//! Shared foundation for the vetgate content-validation workspace: the error
//! taxonomy, application configuration loading, and logging setup.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{load_config, load_config_or_default, AppConfig};
pub use error::{Result, VetgateError};
pub use logging::init_logging;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_functionality() {
        // Smoke test - verify module exports are accessible
        let config = AppConfig::default();
        assert_eq!(config.engine.log_capacity, 1000);
    }
}

//! Error types shared across the vetgate workspace
//!
//! Configuration problems are the only fatal error class in this system:
//! they surface at setup time and must prevent the affected component from
//! being used at all. Policy violations are never errors — they travel as
//! data inside validation results.

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, VetgateError>;

/// Top-level error type for the validation toolkit
#[derive(Debug, thiserror::Error)]
pub enum VetgateError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (config files, log export)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors raised while reading layered configuration sources
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl VetgateError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = VetgateError::config("log_capacity must be positive");
        assert!(matches!(err, VetgateError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: log_capacity must be positive"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = VetgateError::from(io_err);
        assert!(matches!(err, VetgateError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let err = VetgateError::from(bad.unwrap_err());
        assert!(matches!(err, VetgateError::Serialization(_)));
    }

    #[test]
    fn test_result_alias() {
        fn returns_result() -> Result<u32> {
            Ok(7)
        }

        assert_eq!(returns_result().unwrap(), 7);
    }
}

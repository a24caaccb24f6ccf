//! Error types for guardrail construction and registration
//!
//! Only configuration problems are errors here. A guardrail reporting a
//! policy violation is normal operation and travels inside
//! [`GuardrailResult`](crate::GuardrailResult), never through this type.

use vetgate_core::VetgateError;

/// Result type for guardrail operations
pub type Result<T> = std::result::Result<T, GuardrailError>;

/// Errors that can occur while building or registering guardrails
#[derive(Debug, thiserror::Error)]
pub enum GuardrailError {
    /// A regex supplied at construction time did not compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A threshold or parameter was outside its valid range
    #[error("Invalid guardrail configuration: {0}")]
    InvalidConfig(String),

    /// A guardrail with the same name is already registered in the stage
    #[error("Guardrail '{name}' is already registered in the {stage} stage")]
    DuplicateGuardrail { name: String, stage: String },

    /// The session registry refused a new session
    #[error("Session capacity exceeded (limit {limit})")]
    SessionCapacityExceeded { limit: usize },

    /// Generic error from vetgate-core
    #[error(transparent)]
    Core(#[from] VetgateError),
}

impl GuardrailError {
    /// Create an invalid-configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = GuardrailError::invalid_config("max_length must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid guardrail configuration: max_length must be positive"
        );
    }

    #[test]
    fn test_invalid_pattern_from_regex() {
        let bad = regex::Regex::new("(unclosed");
        let err = GuardrailError::from(bad.unwrap_err());
        assert!(matches!(err, GuardrailError::InvalidPattern(_)));
    }

    #[test]
    fn test_duplicate_guardrail_display() {
        let err = GuardrailError::DuplicateGuardrail {
            name: "pii_redactor".to_string(),
            stage: "input".to_string(),
        };
        assert!(err.to_string().contains("pii_redactor"));
        assert!(err.to_string().contains("input"));
    }
}

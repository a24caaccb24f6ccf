//! Content length guardrail

use async_trait::async_trait;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Marker appended to content truncated by the length limiter
pub const TRUNCATION_MARKER: &str = "… [truncated]";

/// Length limiter guardrail
///
/// Fails content that is longer than `max_length` or shorter than
/// `min_length`, counted in characters. Over-long content is truncated to the
/// limit with a marker appended; under-length content is only flagged since
/// there is nothing safe to synthesize.
pub struct LengthLimiter {
    /// Maximum allowed length in characters
    max_length: usize,
    /// Minimum required length in characters
    min_length: usize,
    /// Severity reported on failure
    severity: Severity,
}

impl LengthLimiter {
    /// Create a new length limiter
    ///
    /// `max_length` must be positive and `min_length` must not exceed it.
    pub fn new(max_length: usize, min_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(GuardrailError::invalid_config("max_length must be positive"));
        }
        if min_length > max_length {
            return Err(GuardrailError::invalid_config(format!(
                "min_length {} exceeds max_length {}",
                min_length, max_length
            )));
        }
        Ok(Self {
            max_length,
            min_length,
            severity: Severity::Warning,
        })
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[async_trait]
impl Guardrail for LengthLimiter {
    fn name(&self) -> &str {
        "length_limiter"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let length = content.chars().count();

        if length > self.max_length {
            let truncated: String = content.chars().take(self.max_length).collect();
            return Ok(GuardrailResult::fail(
                self.name(),
                self.severity,
                format!(
                    "Content length {} exceeds maximum {}",
                    length, self.max_length
                ),
            )
            .with_modified_content(format!("{}{}", truncated, TRUNCATION_MARKER))
            .with_metadata(json!({
                "length": length,
                "max_length": self.max_length,
            })));
        }

        if length < self.min_length {
            return Ok(GuardrailResult::fail(
                self.name(),
                self.severity,
                format!(
                    "Content length {} is below minimum {}",
                    length, self.min_length
                ),
            )
            .with_metadata(json!({
                "length": length,
                "min_length": self.min_length,
            })));
        }

        Ok(GuardrailResult::pass(self.name()))
    }
}

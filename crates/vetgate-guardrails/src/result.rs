//! Guardrail verdicts
//!
//! Each guardrail check produces a fresh [`GuardrailResult`]. Failures are
//! data, not errors: a result with `passed == false` is the normal way a
//! policy violation is reported, and only its [`Severity`] decides whether
//! the overall validation run is blocked.

use serde::{Deserialize, Serialize};

/// Severity of a guardrail result, ordered by increasing strictness
///
/// Only `Error` and `Critical` failures block a validation run. `Info` and
/// `Warning` failures are advisory: they are kept in the result list (and may
/// carry a content rewrite) but never flip the overall decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only
    Info,
    /// Advisory - surface but allow
    Warning,
    /// Blocking - refuse the content
    Error,
    /// Blocking - refuse and alert
    Critical,
}

impl Severity {
    /// Whether a failed result at this severity blocks the overall run
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Verdict produced by a single guardrail check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// Whether the content passed this check
    pub passed: bool,

    /// Name of the guardrail that produced this result
    pub rule_name: String,

    /// Severity of this specific result (Info on pass, the guardrail's
    /// configured severity on failure)
    pub severity: Severity,

    /// Human-readable explanation; never empty on failure
    pub message: String,

    /// Replacement content when the guardrail can safely auto-correct
    /// (redaction, truncation); `None` means the content is unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_content: Option<String>,

    /// Diagnostic details (match counts, offsets, scores)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl GuardrailResult {
    /// Create a passing result
    pub fn pass<S: Into<String>>(rule_name: S) -> Self {
        Self {
            passed: true,
            rule_name: rule_name.into(),
            severity: Severity::Info,
            message: String::new(),
            modified_content: None,
            metadata: None,
        }
    }

    /// Create a failing result; the message is mandatory
    pub fn fail<S: Into<String>, M: Into<String>>(
        rule_name: S,
        severity: Severity,
        message: M,
    ) -> Self {
        let message = message.into();
        debug_assert!(!message.is_empty(), "failed results must carry a message");
        Self {
            passed: false,
            rule_name: rule_name.into(),
            severity,
            message,
            modified_content: None,
            metadata: None,
        }
    }

    /// Attach a rewritten version of the content
    pub fn with_modified_content<S: Into<String>>(mut self, content: S) -> Self {
        self.modified_content = Some(content.into());
        self
    }

    /// Attach diagnostic metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this result alone blocks the overall run
    pub fn is_blocking(&self) -> bool {
        !self.passed && self.severity.is_blocking()
    }
}

//! Telemetry event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Telemetry events emitted around validation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Validation run lifecycle events
    ValidationStarted {
        session_id: String,
        stage: String,
        content_length: usize,
        timestamp: DateTime<Utc>,
    },

    ValidationCompleted {
        session_id: String,
        stage: String,
        overall_passed: bool,
        failed_count: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A guardrail reported a failure
    GuardrailTriggered {
        session_id: String,
        guardrail: String,
        severity: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A guardrail rewrote the content
    ContentModified {
        session_id: String,
        guardrail: String,
        original_length: usize,
        modified_length: usize,
        timestamp: DateTime<Utc>,
    },

    /// Session registry events
    SessionEvicted {
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Error events
    ErrorOccurred {
        session_id: String,
        error: String,
        context: Option<Value>,
        timestamp: DateTime<Utc>,
    },

    /// Custom events
    Custom {
        session_id: String,
        event_name: String,
        data: Value,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// Get the session ID associated with this event
    pub fn session_id(&self) -> &str {
        match self {
            Self::ValidationStarted { session_id, .. } => session_id,
            Self::ValidationCompleted { session_id, .. } => session_id,
            Self::GuardrailTriggered { session_id, .. } => session_id,
            Self::ContentModified { session_id, .. } => session_id,
            Self::SessionEvicted { session_id, .. } => session_id,
            Self::ErrorOccurred { session_id, .. } => session_id,
            Self::Custom { session_id, .. } => session_id,
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::ValidationStarted { timestamp, .. } => timestamp,
            Self::ValidationCompleted { timestamp, .. } => timestamp,
            Self::GuardrailTriggered { timestamp, .. } => timestamp,
            Self::ContentModified { timestamp, .. } => timestamp,
            Self::SessionEvicted { timestamp, .. } => timestamp,
            Self::ErrorOccurred { timestamp, .. } => timestamp,
            Self::Custom { timestamp, .. } => timestamp,
        }
    }

    // Convenience constructors
    pub fn validation_started(
        session_id: impl Into<String>,
        stage: impl Into<String>,
        content_length: usize,
    ) -> Self {
        Self::ValidationStarted {
            session_id: session_id.into(),
            stage: stage.into(),
            content_length,
            timestamp: Utc::now(),
        }
    }

    pub fn validation_completed(
        session_id: impl Into<String>,
        stage: impl Into<String>,
        overall_passed: bool,
        failed_count: usize,
        duration_ms: u64,
    ) -> Self {
        Self::ValidationCompleted {
            session_id: session_id.into(),
            stage: stage.into(),
            overall_passed,
            failed_count,
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn guardrail_triggered(
        session_id: impl Into<String>,
        guardrail: impl Into<String>,
        severity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::GuardrailTriggered {
            session_id: session_id.into(),
            guardrail: guardrail.into(),
            severity: severity.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn content_modified(
        session_id: impl Into<String>,
        guardrail: impl Into<String>,
        original_length: usize,
        modified_length: usize,
    ) -> Self {
        Self::ContentModified {
            session_id: session_id.into(),
            guardrail: guardrail.into(),
            original_length,
            modified_length,
            timestamp: Utc::now(),
        }
    }

    pub fn error(session_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::ErrorOccurred {
            session_id: session_id.into(),
            error: error.into(),
            context: None,
            timestamp: Utc::now(),
        }
    }
}

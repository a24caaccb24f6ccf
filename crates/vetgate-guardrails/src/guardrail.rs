//! Guardrail trait definition

use std::time::Duration;

use async_trait::async_trait;

use crate::{GuardrailResult, Result};

/// Caller-supplied context for a validation call
///
/// Deliberately a closed, typed structure rather than an open map: these are
/// the only fields guardrails are contractually allowed to read, which keeps
/// unrelated guardrails from coupling through ad hoc keys.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    /// Identity of the end user, when known
    pub user_id: Option<String>,
    /// Logical conversation/session identifier
    pub session_id: Option<String>,
    /// Zero-based turn number within the session
    pub turn_index: Option<u64>,
    /// Externally sampled resource usage, consumed by the resource limiter
    pub resource_usage: Option<ResourceUsage>,
}

impl CheckContext {
    /// Context carrying only a session id
    pub fn for_session<S: Into<String>>(session_id: S) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    /// Set the user id
    pub fn with_user<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the turn index
    pub fn with_turn(mut self, turn_index: u64) -> Self {
        self.turn_index = Some(turn_index);
        self
    }

    /// Attach sampled resource usage
    pub fn with_resource_usage(mut self, usage: ResourceUsage) -> Self {
        self.resource_usage = Some(usage);
        self
    }
}

/// Memory and wall-clock usage sampled by the caller
#[derive(Debug, Clone, Copy)]
pub struct ResourceUsage {
    /// Resident memory attributed to the work being validated, in bytes
    pub memory_bytes: u64,
    /// Wall-clock time spent producing the content
    pub execution_time: Duration,
}

/// Trait for implementing guardrails
///
/// A guardrail inspects one piece of content and returns a verdict. The
/// verdict must be a pure function of `(content, context, configuration)`
/// except for permitted internal history (rate-limit timestamps, repetition
/// buffers), which may influence later calls but never the current one's
/// inputs.
///
/// Returning `Err` is reserved for internal faults; the engine converts such
/// faults into synthetic critical results rather than aborting the run. A
/// well-behaved guardrail validates its configuration at construction time
/// and never errors on well-formed input.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Unique name of this guardrail within a pipeline stage
    fn name(&self) -> &str;

    /// Check content against this guardrail's policy
    async fn check(&self, content: &str, context: &CheckContext) -> Result<GuardrailResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    struct AlwaysPass;

    #[async_trait]
    impl Guardrail for AlwaysPass {
        fn name(&self) -> &str {
            "always_pass"
        }

        async fn check(&self, _content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
            Ok(GuardrailResult::pass(self.name()))
        }
    }

    struct AlwaysFail;

    #[async_trait]
    impl Guardrail for AlwaysFail {
        fn name(&self) -> &str {
            "always_fail"
        }

        async fn check(&self, _content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
            Ok(GuardrailResult::fail(
                self.name(),
                Severity::Error,
                "always fails",
            ))
        }
    }

    #[tokio::test]
    async fn test_guardrail_trait_objects() {
        let guards: Vec<Box<dyn Guardrail>> = vec![Box::new(AlwaysPass), Box::new(AlwaysFail)];
        let ctx = CheckContext::default();

        let first = guards[0].check("hello", &ctx).await.unwrap();
        assert!(first.passed);

        let second = guards[1].check("hello", &ctx).await.unwrap();
        assert!(!second.passed);
        assert!(second.is_blocking());
    }

    #[test]
    fn test_context_builders() {
        let ctx = CheckContext::for_session("session-9")
            .with_user("alice")
            .with_turn(3)
            .with_resource_usage(ResourceUsage {
                memory_bytes: 1024,
                execution_time: Duration::from_millis(250),
            });

        assert_eq!(ctx.session_id.as_deref(), Some("session-9"));
        assert_eq!(ctx.user_id.as_deref(), Some("alice"));
        assert_eq!(ctx.turn_index, Some(3));
        assert_eq!(ctx.resource_usage.unwrap().memory_bytes, 1024);
    }

    #[test]
    fn test_default_context_is_empty() {
        let ctx = CheckContext::default();
        assert!(ctx.user_id.is_none());
        assert!(ctx.session_id.is_none());
        assert!(ctx.turn_index.is_none());
        assert!(ctx.resource_usage.is_none());
    }
}

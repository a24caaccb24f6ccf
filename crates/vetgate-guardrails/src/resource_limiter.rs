//! Resource usage guardrail

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Resource limiter guardrail
///
/// Compares externally sampled memory and execution time from the check
/// context against fixed thresholds. Purely observational: it never rewrites
/// content, and a context without usage data passes since there is nothing
/// to measure.
pub struct ResourceLimiter {
    /// Maximum allowed memory in bytes
    max_memory_bytes: u64,
    /// Maximum allowed execution time
    max_execution: Duration,
    /// Severity reported on failure
    severity: Severity,
}

impl ResourceLimiter {
    /// Create a new resource limiter; both thresholds must be positive
    pub fn new(max_memory_bytes: u64, max_execution: Duration) -> Result<Self> {
        if max_memory_bytes == 0 {
            return Err(GuardrailError::invalid_config(
                "max_memory_bytes must be positive",
            ));
        }
        if max_execution.is_zero() {
            return Err(GuardrailError::invalid_config(
                "max_execution must be positive",
            ));
        }
        Ok(Self {
            max_memory_bytes,
            max_execution,
            severity: Severity::Error,
        })
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[async_trait]
impl Guardrail for ResourceLimiter {
    fn name(&self) -> &str {
        "resource_limiter"
    }

    async fn check(&self, _content: &str, context: &CheckContext) -> Result<GuardrailResult> {
        let usage = match context.resource_usage {
            Some(usage) => usage,
            None => return Ok(GuardrailResult::pass(self.name())),
        };

        let mut breaches = Vec::new();
        if usage.memory_bytes > self.max_memory_bytes {
            breaches.push(format!(
                "memory usage {} bytes exceeds limit {}",
                usage.memory_bytes, self.max_memory_bytes
            ));
        }
        if usage.execution_time > self.max_execution {
            breaches.push(format!(
                "execution time {:.2}s exceeds limit {:.2}s",
                usage.execution_time.as_secs_f64(),
                self.max_execution.as_secs_f64()
            ));
        }

        if breaches.is_empty() {
            return Ok(GuardrailResult::pass(self.name()));
        }

        Ok(GuardrailResult::fail(
            self.name(),
            self.severity,
            format!("Resource limits breached: {}", breaches.join("; ")),
        )
        .with_metadata(json!({
            "memory_bytes": usage.memory_bytes,
            "max_memory_bytes": self.max_memory_bytes,
            "execution_seconds": usage.execution_time.as_secs_f64(),
            "max_execution_seconds": self.max_execution.as_secs_f64(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrail::ResourceUsage;

    fn usage(memory_bytes: u64, millis: u64) -> CheckContext {
        CheckContext::default().with_resource_usage(ResourceUsage {
            memory_bytes,
            execution_time: Duration::from_millis(millis),
        })
    }

    #[tokio::test]
    async fn test_missing_usage_passes() {
        let limiter = ResourceLimiter::new(1024, Duration::from_secs(1)).unwrap();

        let result = limiter.check("ok", &CheckContext::default()).await.unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_within_limits_passes() {
        let limiter = ResourceLimiter::new(1024, Duration::from_secs(1)).unwrap();

        let result = limiter.check("ok", &usage(512, 500)).await.unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_memory_breach_fails() {
        let limiter = ResourceLimiter::new(1024, Duration::from_secs(1)).unwrap();

        let result = limiter.check("ok", &usage(2048, 100)).await.unwrap();
        assert!(!result.passed);
        assert!(result.is_blocking());
        assert!(result.message.contains("memory"));
        assert!(result.modified_content.is_none());
    }

    #[tokio::test]
    async fn test_time_breach_fails() {
        let limiter = ResourceLimiter::new(1024, Duration::from_millis(200)).unwrap();

        let result = limiter.check("ok", &usage(100, 500)).await.unwrap();
        assert!(!result.passed);
        assert!(result.message.contains("execution time"));
    }

    #[tokio::test]
    async fn test_both_breaches_reported_together() {
        let limiter = ResourceLimiter::new(1024, Duration::from_millis(200)).unwrap();

        let result = limiter.check("ok", &usage(4096, 500)).await.unwrap();
        assert!(result.message.contains("memory"));
        assert!(result.message.contains("execution time"));
    }

    #[tokio::test]
    async fn test_usage_at_limit_passes() {
        let limiter = ResourceLimiter::new(1024, Duration::from_millis(200)).unwrap();

        let result = limiter.check("ok", &usage(1024, 200)).await.unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        assert!(ResourceLimiter::new(0, Duration::from_secs(1)).is_err());
        assert!(ResourceLimiter::new(1024, Duration::ZERO).is_err());
    }
}

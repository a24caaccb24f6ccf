//! Validation engine orchestrating staged guardrail pipelines

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    guardrail::{CheckContext, Guardrail},
    log::{ExecutionLog, ExecutionLogEntry, GuardrailStats, StatisticsSnapshot,
        DEFAULT_LOG_CAPACITY},
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Pipeline stage a guardrail belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Content from the user, before it reaches the agent
    Input,
    /// Content from the agent, before it reaches the user
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Output => write!(f, "output"),
        }
    }
}

/// Aggregated outcome of one validation call
///
/// `final_content` is the content after every `modified_content` rewrite has
/// been folded in, in pipeline order. The engine does not retain the run
/// beyond its derived log entry; it is the caller's to keep or drop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRun {
    /// False iff at least one failed result has blocking severity
    pub overall_passed: bool,
    /// Content after all rewrites
    pub final_content: String,
    /// One result per guardrail invoked, in pipeline order
    pub results: Vec<GuardrailResult>,
}

/// A guardrail registered in a stage, with its activation counters
struct RegisteredGuardrail {
    guardrail: Arc<dyn Guardrail>,
    activation_count: AtomicU64,
    last_activation_time: Mutex<Option<DateTime<Utc>>>,
}

impl RegisteredGuardrail {
    fn new(guardrail: Arc<dyn Guardrail>) -> Self {
        Self {
            guardrail,
            activation_count: AtomicU64::new(0),
            last_activation_time: Mutex::new(None),
        }
    }

    fn record_activation(&self) {
        self.activation_count.fetch_add(1, Ordering::Relaxed);
        let mut last = match self.last_activation_time.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(Utc::now());
    }

    fn stats(&self, stage: Stage) -> GuardrailStats {
        let last = match self.last_activation_time.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        GuardrailStats {
            name: self.guardrail.name().to_string(),
            stage,
            activation_count: self.activation_count.load(Ordering::Relaxed),
            last_activation_time: *last,
        }
    }
}

/// Validation engine
///
/// Runs one stage's ordered guardrail list over content, threading content
/// rewrites from one guardrail into the next, and aggregates the verdicts.
/// Registration order is execution order.
///
/// Every registered guardrail runs on every call, even after a blocking
/// failure, so one call yields the complete violation audit.
pub struct ValidationEngine {
    input_guardrails: Vec<RegisteredGuardrail>,
    output_guardrails: Vec<RegisteredGuardrail>,
    log: ExecutionLog,
}

impl ValidationEngine {
    /// Create an engine with the default log capacity
    pub fn new() -> Self {
        Self {
            input_guardrails: Vec::new(),
            output_guardrails: Vec::new(),
            log: ExecutionLog::new(DEFAULT_LOG_CAPACITY),
        }
    }

    /// Override how many log entries are retained
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log = ExecutionLog::new(capacity);
        self
    }

    /// Append a guardrail to a stage's pipeline
    ///
    /// Names must be unique within a stage; registering a second guardrail
    /// under an existing name is a configuration error, never a silent
    /// overwrite. The same name may appear in both stages.
    pub fn register_guardrail(
        &mut self,
        stage: Stage,
        guardrail: impl Guardrail + 'static,
    ) -> Result<()> {
        let name = guardrail.name().to_string();
        let list = self.stage_mut(stage);
        if list.iter().any(|g| g.guardrail.name() == name) {
            return Err(GuardrailError::DuplicateGuardrail {
                name,
                stage: stage.to_string(),
            });
        }
        list.push(RegisteredGuardrail::new(Arc::new(guardrail)));
        Ok(())
    }

    /// Builder-style registration into the input stage
    pub fn with_input_guardrail(mut self, guardrail: impl Guardrail + 'static) -> Result<Self> {
        self.register_guardrail(Stage::Input, guardrail)?;
        Ok(self)
    }

    /// Builder-style registration into the output stage
    pub fn with_output_guardrail(mut self, guardrail: impl Guardrail + 'static) -> Result<Self> {
        self.register_guardrail(Stage::Output, guardrail)?;
        Ok(self)
    }

    /// Number of guardrails registered in a stage
    pub fn guardrail_count(&self, stage: Stage) -> usize {
        self.stage(stage).len()
    }

    /// Run a stage's guardrails over content
    ///
    /// Guardrails run in registration order; each sees the content as
    /// rewritten by its predecessors. A failed result with blocking severity
    /// clears `overall_passed`; advisory failures are retained in the result
    /// list without blocking. A guardrail returning `Err` is converted into
    /// a synthetic critical failure and validation continues with the
    /// remaining guardrails.
    pub async fn validate(
        &self,
        stage: Stage,
        content: &str,
        context: &CheckContext,
    ) -> ValidationRun {
        let guardrails = self.stage(stage);
        let mut current = content.to_string();
        let mut results = Vec::with_capacity(guardrails.len());
        let mut overall_passed = true;
        let mut content_modified = false;
        let mut failed_guardrails = Vec::new();

        for registered in guardrails {
            registered.record_activation();
            let name = registered.guardrail.name();
            let result = match registered.guardrail.check(&current, context).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Guardrail {} faulted during {} validation: {}", name, stage, e);
                    GuardrailResult::fail(
                        name,
                        Severity::Critical,
                        format!("guardrail {} failed internally: {}", name, e),
                    )
                }
            };

            if !result.passed {
                tracing::warn!(
                    "Guardrail {} failed on {} content: {}",
                    result.rule_name,
                    stage,
                    result.message
                );
                failed_guardrails.push(result.rule_name.clone());
                if result.severity.is_blocking() {
                    overall_passed = false;
                }
            }

            if let Some(modified) = &result.modified_content {
                current = modified.clone();
                content_modified = true;
            }

            results.push(result);
        }

        self.log.append(ExecutionLogEntry {
            timestamp: Utc::now(),
            stage,
            overall_passed,
            guardrail_count: guardrails.len(),
            failed_guardrails,
            content_modified,
        });

        ValidationRun {
            overall_passed,
            final_content: current,
            results,
        }
    }

    /// Read-only aggregation over guardrail counters and the run log
    pub fn get_statistics(&self) -> StatisticsSnapshot {
        let mut per_guardrail =
            Vec::with_capacity(self.input_guardrails.len() + self.output_guardrails.len());
        for registered in &self.input_guardrails {
            per_guardrail.push(registered.stats(Stage::Input));
        }
        for registered in &self.output_guardrails {
            per_guardrail.push(registered.stats(Stage::Output));
        }
        StatisticsSnapshot {
            total_guardrails: per_guardrail.len(),
            total_runs: self.log.total_runs(),
            per_guardrail,
        }
    }

    /// The most recent `n` log entries, oldest of those first
    pub fn recent_entries(&self, n: usize) -> Vec<ExecutionLogEntry> {
        self.log.recent(n)
    }

    fn stage(&self, stage: Stage) -> &Vec<RegisteredGuardrail> {
        match stage {
            Stage::Input => &self.input_guardrails,
            Stage::Output => &self.output_guardrails,
        }
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut Vec<RegisteredGuardrail> {
        match stage {
            Stage::Input => &mut self.input_guardrails,
            Stage::Output => &mut self.output_guardrails,
        }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("input_guardrails", &self.input_guardrails.len())
            .field("output_guardrails", &self.output_guardrails.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NamedPass(&'static str);

    #[async_trait]
    impl Guardrail for NamedPass {
        fn name(&self) -> &str {
            self.0
        }

        async fn check(&self, _content: &str, _ctx: &CheckContext) -> Result<GuardrailResult> {
            Ok(GuardrailResult::pass(self.0))
        }
    }

    struct FailWith(&'static str, Severity);

    #[async_trait]
    impl Guardrail for FailWith {
        fn name(&self) -> &str {
            self.0
        }

        async fn check(&self, _content: &str, _ctx: &CheckContext) -> Result<GuardrailResult> {
            Ok(GuardrailResult::fail(self.0, self.1, "configured to fail"))
        }
    }

    struct Faulty;

    #[async_trait]
    impl Guardrail for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        async fn check(&self, _content: &str, _ctx: &CheckContext) -> Result<GuardrailResult> {
            Err(GuardrailError::invalid_config("internal fault"))
        }
    }

    struct Uppercaser;

    #[async_trait]
    impl Guardrail for Uppercaser {
        fn name(&self) -> &str {
            "uppercaser"
        }

        async fn check(&self, content: &str, _ctx: &CheckContext) -> Result<GuardrailResult> {
            Ok(GuardrailResult::fail(self.name(), Severity::Info, "rewrites")
                .with_modified_content(content.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_empty_stage_passes_through() {
        let engine = ValidationEngine::new();

        let run = engine
            .validate(Stage::Input, "untouched", &CheckContext::default())
            .await;
        assert!(run.overall_passed);
        assert_eq!(run.final_content, "untouched");
        assert!(run.results.is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_registration_order() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(NamedPass("first"))
            .unwrap()
            .with_input_guardrail(NamedPass("second"))
            .unwrap();

        let run = engine
            .validate(Stage::Input, "x", &CheckContext::default())
            .await;
        assert_eq!(run.results[0].rule_name, "first");
        assert_eq!(run.results[1].rule_name, "second");
    }

    #[tokio::test]
    async fn test_duplicate_name_in_stage_rejected() {
        let mut engine = ValidationEngine::new();
        engine
            .register_guardrail(Stage::Input, NamedPass("dup"))
            .unwrap();

        let err = engine
            .register_guardrail(Stage::Input, NamedPass("dup"))
            .unwrap_err();
        assert!(matches!(err, GuardrailError::DuplicateGuardrail { .. }));
    }

    #[tokio::test]
    async fn test_same_name_across_stages_allowed() {
        let mut engine = ValidationEngine::new();
        engine
            .register_guardrail(Stage::Input, NamedPass("shared"))
            .unwrap();
        engine
            .register_guardrail(Stage::Output, NamedPass("shared"))
            .unwrap();

        assert_eq!(engine.guardrail_count(Stage::Input), 1);
        assert_eq!(engine.guardrail_count(Stage::Output), 1);
    }

    #[tokio::test]
    async fn test_rewrite_chains_into_final_content() {
        let engine = ValidationEngine::new()
            .with_output_guardrail(Uppercaser)
            .unwrap();

        let run = engine
            .validate(Stage::Output, "quiet words", &CheckContext::default())
            .await;
        assert_eq!(run.final_content, "QUIET WORDS");

        // Info-severity failure rewrote but did not block
        assert!(run.overall_passed);
    }

    #[tokio::test]
    async fn test_warning_failure_does_not_block() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(FailWith("advisory", Severity::Warning))
            .unwrap();

        let run = engine
            .validate(Stage::Input, "x", &CheckContext::default())
            .await;
        assert!(run.overall_passed);
        assert_eq!(run.results.len(), 1);
        assert!(!run.results[0].passed);
    }

    #[tokio::test]
    async fn test_error_failure_blocks() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(FailWith("strict", Severity::Error))
            .unwrap();

        let run = engine
            .validate(Stage::Input, "x", &CheckContext::default())
            .await;
        assert!(!run.overall_passed);
    }

    #[tokio::test]
    async fn test_no_short_circuit_after_blocking_failure() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(FailWith("blocker", Severity::Critical))
            .unwrap()
            .with_input_guardrail(NamedPass("after"))
            .unwrap();

        let run = engine
            .validate(Stage::Input, "x", &CheckContext::default())
            .await;
        assert!(!run.overall_passed);
        assert_eq!(run.results.len(), 2);
        assert_eq!(run.results[1].rule_name, "after");
        assert!(run.results[1].passed);
    }

    #[tokio::test]
    async fn test_fault_becomes_synthetic_critical() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(Faulty)
            .unwrap()
            .with_input_guardrail(NamedPass("survivor"))
            .unwrap();

        let run = engine
            .validate(Stage::Input, "x", &CheckContext::default())
            .await;
        assert!(!run.overall_passed);
        assert_eq!(run.results.len(), 2);

        let fault = &run.results[0];
        assert!(!fault.passed);
        assert_eq!(fault.severity, Severity::Critical);
        assert!(fault.message.contains("guardrail faulty failed internally"));
        assert!(run.results[1].passed);
    }

    #[tokio::test]
    async fn test_log_and_statistics_track_runs() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(FailWith("strict", Severity::Error))
            .unwrap();

        engine
            .validate(Stage::Input, "a", &CheckContext::default())
            .await;
        engine
            .validate(Stage::Input, "b", &CheckContext::default())
            .await;

        let stats = engine.get_statistics();
        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.total_guardrails, 1);
        assert_eq!(stats.per_guardrail[0].activation_count, 2);
        assert!(stats.per_guardrail[0].last_activation_time.is_some());

        let entries = engine.recent_entries(10);
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].overall_passed);
        assert_eq!(entries[0].failed_guardrails, vec!["strict".to_string()]);
    }

    #[tokio::test]
    async fn test_log_capacity_rotation_keeps_run_count() {
        let engine = ValidationEngine::new().with_log_capacity(1);

        engine
            .validate(Stage::Input, "a", &CheckContext::default())
            .await;
        engine
            .validate(Stage::Output, "b", &CheckContext::default())
            .await;

        let entries = engine.recent_entries(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stage, Stage::Output);
        assert_eq!(engine.get_statistics().total_runs, 2);
    }

    #[tokio::test]
    async fn test_stages_are_independent() {
        let engine = ValidationEngine::new()
            .with_input_guardrail(FailWith("strict", Severity::Error))
            .unwrap();

        let run = engine
            .validate(Stage::Output, "x", &CheckContext::default())
            .await;
        assert!(run.overall_passed);
        assert!(run.results.is_empty());
    }
}

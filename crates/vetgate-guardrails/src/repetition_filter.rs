//! Repetition detection guardrail

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    text::jaccard_similarity,
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Disclaimer prepended to content flagged as repetitive
pub const REPETITION_DISCLAIMER: &str = "As previously noted: ";

/// Repetition filter guardrail
///
/// Compares candidate content against the last N previously emitted contents
/// using token-set Jaccard similarity and fails when the window's best match
/// exceeds the configured threshold. The failure carries a soft correction: a
/// disclaimer prefix rather than a rejection.
///
/// The history is filled only through explicit [`update_context`] calls made
/// by the caller after a turn is actually emitted; checking never records.
/// Clones share the history, so one handle can sit in a pipeline while the
/// caller keeps another for updates.
///
/// [`update_context`]: RepetitionFilter::update_context
pub struct RepetitionFilter {
    /// Similarity above which content counts as repetition
    max_similarity: f64,
    /// Number of previous contents to compare against
    lookback_n: usize,
    /// Recently emitted contents, oldest first
    history: Arc<Mutex<VecDeque<String>>>,
    /// Severity reported on failure
    severity: Severity,
}

impl RepetitionFilter {
    /// Create a new repetition filter
    ///
    /// `max_similarity` must be within `0.0..=1.0` and `lookback_n` positive.
    pub fn new(max_similarity: f64, lookback_n: usize) -> Result<Self> {
        if !(0.0..=1.0).contains(&max_similarity) {
            return Err(GuardrailError::invalid_config(format!(
                "max_similarity must be within 0.0..=1.0, got {}",
                max_similarity
            )));
        }
        if lookback_n == 0 {
            return Err(GuardrailError::invalid_config("lookback_n must be positive"));
        }
        Ok(Self {
            max_similarity,
            lookback_n,
            history: Arc::new(Mutex::new(VecDeque::new())),
            severity: Severity::Warning,
        })
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Record an emitted content into the lookback window
    pub fn update_context(&self, content: &str) {
        let mut history = match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        history.push_back(content.to_string());
        while history.len() > self.lookback_n {
            history.pop_front();
        }
    }
}

impl Clone for RepetitionFilter {
    fn clone(&self) -> Self {
        Self {
            max_similarity: self.max_similarity,
            lookback_n: self.lookback_n,
            history: Arc::clone(&self.history),
            severity: self.severity,
        }
    }
}

#[async_trait]
impl Guardrail for RepetitionFilter {
    fn name(&self) -> &str {
        "repetition_filter"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let best = {
            let history = match self.history.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            history
                .iter()
                .map(|previous| jaccard_similarity(content, previous))
                .fold(0.0_f64, f64::max)
        };

        if best > self.max_similarity {
            return Ok(GuardrailResult::fail(
                self.name(),
                self.severity,
                format!(
                    "Content repeats recent output (similarity {:.2} exceeds {:.2})",
                    best, self.max_similarity
                ),
            )
            .with_modified_content(format!("{}{}", REPETITION_DISCLAIMER, content))
            .with_metadata(json!({ "max_similarity": best })));
        }

        Ok(GuardrailResult::pass(self.name()))
    }
}

//! Topic drift guardrail

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    text::tokenize,
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Topic filter guardrail
///
/// Scores content against each allowed topic's keyword set: the score is the
/// fraction of distinct content tokens that appear in the topic's keywords.
/// If no topic scores at least `max_drift_score` the content has drifted; the
/// failure carries a redirection notice prepended to the content, naming the
/// best-matching allowed topic.
pub struct TopicFilter {
    /// Allowed topic and its lowercase keyword set, in registration order
    topics: Vec<(String, HashSet<String>)>,
    /// Minimum best-topic score for content to count as on-topic
    max_drift_score: f64,
    /// Severity reported on failure
    severity: Severity,
}

impl TopicFilter {
    /// Create a new topic filter
    ///
    /// Every allowed topic must have a non-empty entry in the keyword
    /// lexicon; `max_drift_score` must be within `0.0..=1.0`.
    pub fn new(
        allowed_topics: Vec<String>,
        keyword_lexicon: HashMap<String, Vec<String>>,
        max_drift_score: f64,
    ) -> Result<Self> {
        if allowed_topics.is_empty() {
            return Err(GuardrailError::invalid_config(
                "at least one allowed topic is required",
            ));
        }
        if !(0.0..=1.0).contains(&max_drift_score) {
            return Err(GuardrailError::invalid_config(format!(
                "max_drift_score must be within 0.0..=1.0, got {}",
                max_drift_score
            )));
        }

        let mut topics = Vec::with_capacity(allowed_topics.len());
        for topic in allowed_topics {
            let keywords = keyword_lexicon.get(&topic).ok_or_else(|| {
                GuardrailError::invalid_config(format!(
                    "no keyword lexicon entry for topic '{}'",
                    topic
                ))
            })?;
            if keywords.is_empty() {
                return Err(GuardrailError::invalid_config(format!(
                    "keyword lexicon entry for topic '{}' is empty",
                    topic
                )));
            }
            let set: HashSet<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
            topics.push((topic, set));
        }

        Ok(Self {
            topics,
            max_drift_score,
            severity: Severity::Warning,
        })
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Best-scoring topic for the given token set; ties keep the earlier
    /// topic. An empty token set scores 0.0 against everything.
    fn best_topic(&self, tokens: &HashSet<String>) -> (&str, f64) {
        let mut best_name = self.topics[0].0.as_str();
        let mut best_score = 0.0_f64;
        for (name, keywords) in &self.topics {
            let score = if tokens.is_empty() {
                0.0
            } else {
                let overlap = tokens.iter().filter(|t| keywords.contains(*t)).count();
                overlap as f64 / tokens.len() as f64
            };
            if score > best_score {
                best_name = name;
                best_score = score;
            }
        }
        (best_name, best_score)
    }
}

#[async_trait]
impl Guardrail for TopicFilter {
    fn name(&self) -> &str {
        "topic_filter"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let tokens: HashSet<String> = tokenize(content).into_iter().collect();
        let (best_name, best_score) = self.best_topic(&tokens);

        if best_score < self.max_drift_score {
            return Ok(GuardrailResult::fail(
                self.name(),
                self.severity,
                format!(
                    "Content drifts from allowed topics (best match '{}' scored {:.2}, required {:.2})",
                    best_name, best_score, self.max_drift_score
                ),
            )
            .with_modified_content(format!(
                "Let's bring this back to {}. {}",
                best_name, content
            ))
            .with_metadata(json!({
                "best_topic": best_name,
                "best_score": best_score,
            })));
        }

        Ok(GuardrailResult::pass(self.name()))
    }
}

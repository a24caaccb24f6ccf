//! PII detection and redaction guardrail

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailResult, Result, Severity,
};

/// Default PII categories in priority order
///
/// When two categories match at the same position, the longer match wins and
/// remaining ties go to the earlier category in this list.
const DEFAULT_PATTERNS: [(&str, &str); 5] = [
    ("EMAIL", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
    ("PHONE", r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b"),
    ("NATIONAL_ID", r"\b\d{3}-?\d{2}-?\d{4}\b"),
    ("CREDIT_CARD", r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b"),
    ("BANK_ACCOUNT", r"\b\d{8,17}\b"),
];

struct PiiMatch {
    start: usize,
    end: usize,
    category: usize,
}

/// PII redactor guardrail
///
/// Scans content for personally identifiable information across several
/// categories and replaces every match with a `[<CATEGORY>_REDACTED]`
/// placeholder. Any match fails the check; the redacted text travels in
/// `modified_content` so downstream guardrails and the caller see only the
/// sanitized version.
pub struct PiiRedactor {
    /// Category label and matcher, in priority order
    patterns: Vec<(String, Regex)>,
    /// Severity reported on failure
    severity: Severity,
}

impl PiiRedactor {
    /// Create a redactor with the default categories
    /// (EMAIL, PHONE, NATIONAL_ID, CREDIT_CARD, BANK_ACCOUNT)
    pub fn new() -> Result<Self> {
        let mut patterns = Vec::with_capacity(DEFAULT_PATTERNS.len());
        for (label, pattern) in DEFAULT_PATTERNS {
            patterns.push((label.to_string(), Regex::new(pattern)?));
        }
        Ok(Self {
            patterns,
            severity: Severity::Error,
        })
    }

    /// Add a category, or replace the pattern of an existing one
    ///
    /// The label is uppercased and becomes the `[<LABEL>_REDACTED]`
    /// placeholder text.
    pub fn with_pattern(mut self, label: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        let label = label.to_uppercase();
        if let Some(entry) = self.patterns.iter_mut().find(|(l, _)| *l == label) {
            entry.1 = regex;
        } else {
            self.patterns.push((label, regex));
        }
        Ok(self)
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Collect matches across all categories, resolving overlaps by earliest
    /// start, then longest match, then category order.
    fn resolve_matches(&self, content: &str) -> Vec<PiiMatch> {
        let mut matches: Vec<PiiMatch> = Vec::new();
        for (category, (_, regex)) in self.patterns.iter().enumerate() {
            for m in regex.find_iter(content) {
                matches.push(PiiMatch {
                    start: m.start(),
                    end: m.end(),
                    category,
                });
            }
        }

        matches.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.category.cmp(&b.category))
        });

        let mut accepted: Vec<PiiMatch> = Vec::new();
        for m in matches {
            let overlaps = accepted.last().is_some_and(|prev| m.start < prev.end);
            if !overlaps {
                accepted.push(m);
            }
        }
        accepted
    }
}

#[async_trait]
impl Guardrail for PiiRedactor {
    fn name(&self) -> &str {
        "pii_redactor"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let accepted = self.resolve_matches(content);
        if accepted.is_empty() {
            return Ok(GuardrailResult::pass(self.name()));
        }

        let mut counts = vec![0usize; self.patterns.len()];
        let mut redacted = String::with_capacity(content.len());
        let mut cursor = 0;
        for m in &accepted {
            counts[m.category] += 1;
            redacted.push_str(&content[cursor..m.start]);
            redacted.push_str(&format!("[{}_REDACTED]", self.patterns[m.category].0));
            cursor = m.end;
        }
        redacted.push_str(&content[cursor..]);

        let mut parts = Vec::new();
        let mut categories = serde_json::Map::new();
        for (i, count) in counts.iter().enumerate() {
            if *count > 0 {
                let label = &self.patterns[i].0;
                parts.push(format!("{} ({})", label, count));
                categories.insert(label.clone(), json!(count));
            }
        }

        Ok(GuardrailResult::fail(
            self.name(),
            self.severity,
            format!("Detected PII: {}", parts.join(", ")),
        )
        .with_modified_content(redacted)
        .with_metadata(json!({
            "total_matches": accepted.len(),
            "categories": categories,
        })))
    }
}

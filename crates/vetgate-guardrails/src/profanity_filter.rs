//! Profanity filtering guardrail

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Profanity filter guardrail
///
/// Matches content case-insensitively against a fixed blocklist and masks
/// each hit with asterisks of equal character length. Optional evasion
/// patterns catch obfuscated spellings; their matches are reported but not
/// masked, since the literal span may not equal the canonical word.
pub struct ProfanityFilter {
    /// Canonical blocked words, parallel to `word_patterns`
    blocked_words: Vec<String>,
    /// Case-insensitive matcher per blocked word
    word_patterns: Vec<Regex>,
    /// Obfuscation-evasion patterns
    evasion_patterns: Vec<Regex>,
    /// Severity reported on failure
    severity: Severity,
}

impl ProfanityFilter {
    /// Create a new profanity filter from a blocklist
    pub fn new(blocked_words: Vec<String>) -> Result<Self> {
        let mut words = Vec::with_capacity(blocked_words.len());
        let mut patterns = Vec::with_capacity(blocked_words.len());
        for word in blocked_words {
            if word.trim().is_empty() {
                return Err(GuardrailError::invalid_config(
                    "blocked words must not be empty",
                ));
            }
            let pattern = Regex::new(&format!("(?i){}", regex::escape(&word)))?;
            words.push(word.to_lowercase());
            patterns.push(pattern);
        }
        Ok(Self {
            blocked_words: words,
            word_patterns: patterns,
            evasion_patterns: Vec::new(),
            severity: Severity::Warning,
        })
    }

    /// Add an obfuscation-evasion regex
    pub fn with_evasion_pattern(mut self, pattern: &str) -> Result<Self> {
        self.evasion_patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Mask blocklist matches, returning the masked text and the distinct
    /// words that matched. `None` when nothing matched.
    fn mask(&self, content: &str) -> Option<(String, Vec<String>)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut matched_words: Vec<String> = Vec::new();

        for (word, pattern) in self.blocked_words.iter().zip(&self.word_patterns) {
            let mut hit = false;
            for m in pattern.find_iter(content) {
                ranges.push((m.start(), m.end()));
                hit = true;
            }
            if hit {
                matched_words.push(word.clone());
            }
        }

        if ranges.is_empty() {
            return None;
        }

        // Merge overlapping spans so adjacent blocklist hits mask cleanly
        ranges.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, prev_end)) if start <= *prev_end => *prev_end = (*prev_end).max(end),
                _ => merged.push((start, end)),
            }
        }

        let mut masked = String::with_capacity(content.len());
        let mut cursor = 0;
        for (start, end) in merged {
            masked.push_str(&content[cursor..start]);
            let span_chars = content[start..end].chars().count();
            masked.push_str(&"*".repeat(span_chars));
            cursor = end;
        }
        masked.push_str(&content[cursor..]);

        Some((masked, matched_words))
    }
}

#[async_trait]
impl Guardrail for ProfanityFilter {
    fn name(&self) -> &str {
        "profanity_filter"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let masked = self.mask(content);
        let evasion_hits: Vec<String> = self
            .evasion_patterns
            .iter()
            .filter(|p| p.is_match(content))
            .map(|p| p.as_str().to_string())
            .collect();

        if masked.is_none() && evasion_hits.is_empty() {
            return Ok(GuardrailResult::pass(self.name()));
        }

        let (modified, matched_words) = match masked {
            Some((text, words)) => (Some(text), words),
            None => (None, Vec::new()),
        };

        let mut reasons = Vec::new();
        if !matched_words.is_empty() {
            reasons.push(format!("blocked words: {}", matched_words.join(", ")));
        }
        if !evasion_hits.is_empty() {
            reasons.push(format!("{} evasion pattern match(es)", evasion_hits.len()));
        }

        let mut result = GuardrailResult::fail(
            self.name(),
            self.severity,
            format!("Contains prohibited language ({})", reasons.join("; ")),
        )
        .with_metadata(json!({
            "matched_words": matched_words,
            "evasion_patterns": evasion_hits,
        }));

        if let Some(text) = modified {
            result = result.with_modified_content(text);
        }

        Ok(result)
    }
}

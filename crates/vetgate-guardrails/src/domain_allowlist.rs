//! Domain allowlist guardrail

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailError, GuardrailResult, Result, Severity,
};

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Domain allowlist guardrail
///
/// Extracts `http(s)://` URLs from content and fails when any URL's host is
/// not on the allowlist. Independently of the host check, every extracted URL
/// consumes one slot of a sliding-window call budget shared across all checks
/// of the instance; an exhausted budget also fails.
///
/// Hosts are compared lowercased and exactly, with ports and paths stripped.
/// Clones share the call budget.
pub struct DomainAllowlist {
    /// Permitted hosts, lowercase
    allowed_domains: HashSet<String>,
    /// Maximum URL slots per window
    max_calls_per_window: usize,
    /// Sliding window length
    window: Duration,
    /// URL matcher
    url_pattern: Regex,
    /// Timestamps of consumed slots, oldest first
    calls: Arc<Mutex<VecDeque<Instant>>>,
    /// Severity reported on failure
    severity: Severity,
}

impl DomainAllowlist {
    /// Create a new domain allowlist; the call budget must be positive
    pub fn new(allowed_domains: Vec<String>, max_calls_per_window: usize) -> Result<Self> {
        if max_calls_per_window == 0 {
            return Err(GuardrailError::invalid_config(
                "max_calls_per_window must be positive",
            ));
        }
        Ok(Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect(),
            max_calls_per_window,
            window: DEFAULT_WINDOW,
            url_pattern: Regex::new(r"(?i)https?://[^\s]+")?,
            calls: Arc::new(Mutex::new(VecDeque::new())),
            severity: Severity::Error,
        })
    }

    /// Override the sliding window length (default 60 seconds)
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Lowercased host of an extracted URL, without port or path
    fn host_of(url: &str) -> Option<String> {
        let scheme_end = url.find("://")?;
        let rest = &url[scheme_end + 3..];
        let end = rest
            .find(|c| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        let mut host = &rest[..end];
        if let Some(port) = host.find(':') {
            host = &host[..port];
        }
        let host = host
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }

    /// Consume one budget slot per URL; true when any slot was unavailable
    fn consume_budget(&self, url_count: usize) -> bool {
        let now = Instant::now();
        let mut calls = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while calls
            .front()
            .is_some_and(|t| now.duration_since(*t) > self.window)
        {
            calls.pop_front();
        }

        let mut exhausted = false;
        for _ in 0..url_count {
            if calls.len() >= self.max_calls_per_window {
                exhausted = true;
            } else {
                calls.push_back(now);
            }
        }
        exhausted
    }
}

impl Clone for DomainAllowlist {
    fn clone(&self) -> Self {
        Self {
            allowed_domains: self.allowed_domains.clone(),
            max_calls_per_window: self.max_calls_per_window,
            window: self.window,
            url_pattern: self.url_pattern.clone(),
            calls: Arc::clone(&self.calls),
            severity: self.severity,
        }
    }
}

#[async_trait]
impl Guardrail for DomainAllowlist {
    fn name(&self) -> &str {
        "domain_allowlist"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let urls: Vec<&str> = self
            .url_pattern
            .find_iter(content)
            .map(|m| m.as_str())
            .collect();
        if urls.is_empty() {
            return Ok(GuardrailResult::pass(self.name()));
        }

        let budget_exhausted = self.consume_budget(urls.len());

        let mut disallowed: Vec<String> = Vec::new();
        for url in &urls {
            match Self::host_of(url) {
                Some(host) if self.allowed_domains.contains(&host) => {}
                Some(host) => disallowed.push(host),
                None => disallowed.push(url.to_string()),
            }
        }
        disallowed.dedup();

        if disallowed.is_empty() && !budget_exhausted {
            return Ok(GuardrailResult::pass(self.name()));
        }

        let mut reasons = Vec::new();
        if !disallowed.is_empty() {
            reasons.push(format!("disallowed domain(s): {}", disallowed.join(", ")));
        }
        if budget_exhausted {
            reasons.push(format!(
                "URL call budget exhausted ({} per {:?})",
                self.max_calls_per_window, self.window
            ));
        }

        Ok(GuardrailResult::fail(
            self.name(),
            self.severity,
            format!("URL policy violation: {}", reasons.join("; ")),
        )
        .with_metadata(json!({
            "urls": urls.len(),
            "disallowed": disallowed,
            "budget_exhausted": budget_exhausted,
        })))
    }
}

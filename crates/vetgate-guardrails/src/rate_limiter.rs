//! Rate limiting guardrail using per-instance sliding windows

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailError, GuardrailResult, Result, Severity,
};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

/// Rate limiter guardrail
///
/// Tracks check timestamps in a per-instance sliding window and fails once
/// the minute or hour budget is reached. Failed checks are not recorded, so a
/// rejected call does not consume budget; recorded timestamps are never
/// rolled back, so an abandoned call still counts.
///
/// One instance covers one identity. Callers validating several sessions or
/// users through the same pipeline must build one instance per identity, not
/// share a single limiter across all of them (see the session registry).
pub struct RateLimiter {
    /// Maximum checks within any 60 second window
    max_per_minute: usize,
    /// Maximum checks within any one hour window
    max_per_hour: usize,
    /// Timestamps of recorded checks, oldest first
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    /// Severity reported on failure
    severity: Severity,
}

impl RateLimiter {
    /// Create a new rate limiter; both budgets must be positive
    pub fn new(max_per_minute: usize, max_per_hour: usize) -> Result<Self> {
        if max_per_minute == 0 || max_per_hour == 0 {
            return Err(GuardrailError::invalid_config(
                "rate limits must be positive",
            ));
        }
        Ok(Self {
            max_per_minute,
            max_per_hour,
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            severity: Severity::Error,
        })
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            max_per_minute: self.max_per_minute,
            max_per_hour: self.max_per_hour,
            timestamps: Arc::clone(&self.timestamps),
            severity: self.severity,
        }
    }
}

#[async_trait]
impl Guardrail for RateLimiter {
    fn name(&self) -> &str {
        "rate_limiter"
    }

    async fn check(&self, _content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let now = Instant::now();
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Entries older than an hour can never count again
        while timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) > HOUR)
        {
            timestamps.pop_front();
        }

        let hour_count = timestamps.len();
        let minute_count = timestamps
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) <= MINUTE)
            .count();

        if minute_count >= self.max_per_minute {
            return Ok(GuardrailResult::fail(
                self.name(),
                self.severity,
                format!(
                    "Rate limit exceeded: {} check(s) in the last minute (limit {})",
                    minute_count, self.max_per_minute
                ),
            )
            .with_metadata(json!({
                "minute_count": minute_count,
                "hour_count": hour_count,
            })));
        }

        if hour_count >= self.max_per_hour {
            return Ok(GuardrailResult::fail(
                self.name(),
                self.severity,
                format!(
                    "Rate limit exceeded: {} check(s) in the last hour (limit {})",
                    hour_count, self.max_per_hour
                ),
            )
            .with_metadata(json!({
                "minute_count": minute_count,
                "hour_count": hour_count,
            })));
        }

        timestamps.push_back(now);
        Ok(GuardrailResult::pass(self.name()))
    }
}

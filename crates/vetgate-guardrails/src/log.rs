//! Execution log and statistics for the validation engine

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::Stage;

/// Default number of entries retained by the execution log
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// One validation run, as recorded in the execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// When the run completed
    pub timestamp: DateTime<Utc>,
    /// Which stage was validated
    pub stage: Stage,
    /// Whether the run passed overall
    pub overall_passed: bool,
    /// How many guardrails ran
    pub guardrail_count: usize,
    /// Names of guardrails that failed, in pipeline order
    pub failed_guardrails: Vec<String>,
    /// Whether any guardrail rewrote the content
    pub content_modified: bool,
}

/// Bounded ring of recent validation runs
///
/// The log keeps at most `capacity` entries, dropping the oldest on
/// overflow. The run counter is independent of rotation, so it keeps
/// counting after old entries have been dropped.
pub struct ExecutionLog {
    entries: Mutex<VecDeque<ExecutionLogEntry>>,
    capacity: usize,
    total_runs: AtomicU64,
}

impl ExecutionLog {
    /// Create a log retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
            total_runs: AtomicU64::new(0),
        }
    }

    /// Append an entry, rotating out the oldest when full
    pub fn append(&self, entry: ExecutionLogEntry) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// The most recent `n` entries, oldest of those first
    pub fn recent(&self, n: usize) -> Vec<ExecutionLogEntry> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut recent: Vec<ExecutionLogEntry> = entries.iter().rev().take(n).cloned().collect();
        recent.reverse();
        recent
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.len()
    }

    /// Whether the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total runs recorded, including rotated-out entries
    pub fn total_runs(&self) -> u64 {
        self.total_runs.load(Ordering::Relaxed)
    }

    /// Maximum retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Per-guardrail counters reported in a statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailStats {
    /// Guardrail name
    pub name: String,
    /// Stage the guardrail is registered in
    pub stage: Stage,
    /// Checks this guardrail has produced, passes included
    pub activation_count: u64,
    /// When the guardrail last produced a result
    pub last_activation_time: Option<DateTime<Utc>>,
}

/// Read-only aggregation over engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Registered guardrails across both stages
    pub total_guardrails: usize,
    /// Validation runs since the engine was built
    pub total_runs: u64,
    /// Counters per registered guardrail, input stage first
    pub per_guardrail: Vec<GuardrailStats>,
}

//! Per-session validation engines using DashMap

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::{config::PipelineConfig, error::GuardrailError, Result, ValidationEngine};

/// Concurrent registry of per-session validation engines
///
/// Stateful guardrails keep history per engine instance, so sharing one
/// engine across sessions would mix their rate windows and repetition
/// histories. This registry builds a fresh engine from the same
/// configuration the first time a session is seen and hands back the same
/// instance on every later call.
///
/// # Example
///
/// ```
/// use vetgate_guardrails::{PipelineConfig, SessionEngines};
///
/// let config = PipelineConfig::default();
/// let engines = SessionEngines::new(config);
///
/// // Disabled configuration yields no engine
/// assert!(engines.get_or_create("session-1").unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct SessionEngines {
    /// Engines keyed by session id
    engines: Arc<DashMap<String, Arc<ValidationEngine>>>,
    /// Configuration every new engine is built from
    config: Arc<PipelineConfig>,
    /// Maximum number of sessions to track
    max_capacity: Option<usize>,
}

impl SessionEngines {
    /// Create a new registry
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            engines: Arc::new(DashMap::new()),
            config: Arc::new(config),
            max_capacity: None,
        }
    }

    /// Create a new registry with a session limit
    pub fn with_capacity(config: PipelineConfig, max_capacity: usize) -> Self {
        Self {
            engines: Arc::new(DashMap::new()),
            config: Arc::new(config),
            max_capacity: Some(max_capacity),
        }
    }

    /// Get the engine for a session, building it on first access
    ///
    /// Returns `None` when the configuration has validation disabled or no
    /// guardrail enabled. Concurrent calls for the same new session build
    /// exactly one engine.
    pub fn get_or_create(&self, session_id: &str) -> Result<Option<Arc<ValidationEngine>>> {
        if !self.engines.contains_key(session_id) && self.is_at_capacity() {
            return Err(GuardrailError::SessionCapacityExceeded {
                limit: self.max_capacity.unwrap_or(0),
            });
        }

        match self.engines.entry(session_id.to_string()) {
            Entry::Occupied(entry) => Ok(Some(Arc::clone(entry.get()))),
            Entry::Vacant(entry) => match self.config.build_engine()? {
                Some(engine) => {
                    let engine = Arc::new(engine);
                    entry.insert(Arc::clone(&engine));
                    tracing::debug!("Built validation engine for session: {}", session_id);
                    Ok(Some(engine))
                }
                None => Ok(None),
            },
        }
    }

    /// Evict a session's engine
    ///
    /// Returns `true` when an engine existed. Evicting is idempotent.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.engines.remove(session_id).is_some();
        if removed {
            tracing::debug!("Evicted validation engine for session: {}", session_id);
        }
        removed
    }

    /// Drop all session engines
    pub fn clear(&self) -> usize {
        let count = self.engines.len();
        self.engines.clear();
        tracing::info!("Cleared {} session engine(s)", count);
        count
    }

    /// Ids of currently tracked sessions
    pub fn session_ids(&self) -> Vec<String> {
        self.engines.iter().map(|entry| entry.key().clone()).collect()
    }

    /// The configuration new engines are built from
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the current number of session engines
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    fn is_at_capacity(&self) -> bool {
        if let Some(max) = self.max_capacity {
            self.engines.len() >= max
        } else {
            false
        }
    }
}

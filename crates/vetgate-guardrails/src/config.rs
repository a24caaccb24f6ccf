//! Configuration for validation pipelines

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    engine::Stage, log::DEFAULT_LOG_CAPACITY, schema_validator::FieldType, DomainAllowlist,
    LengthLimiter, PiiRedactor, ProfanityFilter, RateLimiter, RepetitionFilter, ResourceLimiter,
    Result, SchemaValidator, TopicFilter, ValidationEngine,
};

/// Configuration for a validation engine
///
/// Each stage holds one section per built-in guardrail with an `enabled`
/// flag. [`build_engine`](PipelineConfig::build_engine) turns the
/// configuration into a ready engine; stateful guardrails get fresh state per
/// build, so building once per session keeps their histories per-session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Enable validation globally
    #[serde(default)]
    pub enabled: bool,

    /// How many execution log entries the engine retains
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Input stage guardrails
    #[serde(default)]
    pub input: StageConfig,

    /// Output stage guardrails
    #[serde(default)]
    pub output: StageConfig,
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_capacity: default_log_capacity(),
            input: StageConfig::default(),
            output: StageConfig::default(),
        }
    }
}

/// Guardrail sections for one pipeline stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageConfig {
    /// Rate limiter configuration
    #[serde(default)]
    pub rate_limiter: RateLimiterConfig,

    /// PII redactor configuration
    #[serde(default)]
    pub pii_redactor: PiiRedactorConfig,

    /// Profanity filter configuration
    #[serde(default)]
    pub profanity_filter: ProfanityFilterConfig,

    /// Topic filter configuration
    #[serde(default)]
    pub topic_filter: TopicFilterConfig,

    /// Repetition filter configuration
    #[serde(default)]
    pub repetition_filter: RepetitionFilterConfig,

    /// Schema validator configuration
    #[serde(default)]
    pub schema_validator: SchemaValidatorConfig,

    /// Domain allowlist configuration
    #[serde(default)]
    pub domain_allowlist: DomainAllowlistConfig,

    /// Resource limiter configuration
    #[serde(default)]
    pub resource_limiter: ResourceLimiterConfig,

    /// Length limiter configuration
    #[serde(default)]
    pub length_limiter: LengthLimiterConfig,
}

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Enable the rate limiter
    #[serde(default)]
    pub enabled: bool,

    /// Maximum checks per minute
    #[serde(default = "default_max_per_minute")]
    pub max_per_minute: usize,

    /// Maximum checks per hour
    #[serde(default = "default_max_per_hour")]
    pub max_per_hour: usize,
}

fn default_max_per_minute() -> usize {
    60
}

fn default_max_per_hour() -> usize {
    1000
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_per_minute: default_max_per_minute(),
            max_per_hour: default_max_per_hour(),
        }
    }
}

/// PII redactor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PiiRedactorConfig {
    /// Enable the PII redactor
    #[serde(default)]
    pub enabled: bool,

    /// Extra categories as label -> regex, added to the defaults
    #[serde(default)]
    pub extra_patterns: HashMap<String, String>,
}

/// Profanity filter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfanityFilterConfig {
    /// Enable the profanity filter
    #[serde(default)]
    pub enabled: bool,

    /// Words to block
    #[serde(default)]
    pub blocked_words: Vec<String>,

    /// Obfuscation-evasion regex patterns
    #[serde(default)]
    pub evasion_patterns: Vec<String>,
}

/// Topic filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicFilterConfig {
    /// Enable the topic filter
    #[serde(default)]
    pub enabled: bool,

    /// Topics content is allowed to discuss
    #[serde(default)]
    pub allowed_topics: Vec<String>,

    /// Keywords per topic
    #[serde(default)]
    pub keyword_lexicon: HashMap<String, Vec<String>>,

    /// Minimum best-topic score
    #[serde(default = "default_max_drift_score")]
    pub max_drift_score: f64,
}

fn default_max_drift_score() -> f64 {
    0.1
}

impl Default for TopicFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_topics: Vec::new(),
            keyword_lexicon: HashMap::new(),
            max_drift_score: default_max_drift_score(),
        }
    }
}

/// Repetition filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepetitionFilterConfig {
    /// Enable the repetition filter
    #[serde(default)]
    pub enabled: bool,

    /// Similarity above which content counts as repetition
    #[serde(default = "default_max_similarity")]
    pub max_similarity: f64,

    /// Number of previous contents to compare against
    #[serde(default = "default_lookback_n")]
    pub lookback_n: usize,
}

fn default_max_similarity() -> f64 {
    0.9
}

fn default_lookback_n() -> usize {
    5
}

impl Default for RepetitionFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_similarity: default_max_similarity(),
            lookback_n: default_lookback_n(),
        }
    }
}

/// Schema validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaValidatorConfig {
    /// Enable the schema validator
    #[serde(default)]
    pub enabled: bool,

    /// Fields every embedded fragment must contain
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Declared field types, checked when present
    #[serde(default)]
    pub field_types: HashMap<String, FieldType>,

    /// Maximum container nesting depth
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_max_nesting_depth() -> usize {
    10
}

impl Default for SchemaValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            required_fields: Vec::new(),
            field_types: HashMap::new(),
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

/// Domain allowlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainAllowlistConfig {
    /// Enable the domain allowlist
    #[serde(default)]
    pub enabled: bool,

    /// Permitted hosts
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// URL budget per window
    #[serde(default = "default_max_calls_per_window")]
    pub max_calls_per_window: usize,

    /// Budget window in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

fn default_max_calls_per_window() -> usize {
    30
}

fn default_window_seconds() -> u64 {
    60
}

impl Default for DomainAllowlistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_domains: Vec::new(),
            max_calls_per_window: default_max_calls_per_window(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Resource limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimiterConfig {
    /// Enable the resource limiter
    #[serde(default)]
    pub enabled: bool,

    /// Maximum memory in bytes
    #[serde(default = "default_max_memory_bytes")]
    pub max_memory_bytes: u64,

    /// Maximum execution time in seconds
    #[serde(default = "default_max_execution_seconds")]
    pub max_execution_seconds: u64,
}

fn default_max_memory_bytes() -> u64 {
    512 * 1024 * 1024
}

fn default_max_execution_seconds() -> u64 {
    30
}

impl Default for ResourceLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_memory_bytes: default_max_memory_bytes(),
            max_execution_seconds: default_max_execution_seconds(),
        }
    }
}

/// Length limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthLimiterConfig {
    /// Enable the length limiter
    #[serde(default)]
    pub enabled: bool,

    /// Maximum content length in characters
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Minimum content length in characters
    #[serde(default)]
    pub min_length: usize,
}

fn default_max_length() -> usize {
    10_000
}

impl Default for LengthLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_length: default_max_length(),
            min_length: 0,
        }
    }
}

impl StageConfig {
    /// Register this stage's enabled guardrails into the engine
    ///
    /// Registration order is fixed: rate limiter, PII redactor, profanity
    /// filter, topic filter, repetition filter, schema validator, domain
    /// allowlist, resource limiter, length limiter. Redaction runs before
    /// the checks that read content and truncation runs last so its marker
    /// survives.
    fn register_into(&self, engine: &mut ValidationEngine, stage: Stage) -> Result<usize> {
        let mut count = 0;

        if self.rate_limiter.enabled {
            engine.register_guardrail(
                stage,
                RateLimiter::new(
                    self.rate_limiter.max_per_minute,
                    self.rate_limiter.max_per_hour,
                )?,
            )?;
            count += 1;
        }

        if self.pii_redactor.enabled {
            let mut redactor = PiiRedactor::new()?;
            let mut labels: Vec<&String> = self.pii_redactor.extra_patterns.keys().collect();
            labels.sort();
            for label in labels {
                redactor = redactor.with_pattern(label, &self.pii_redactor.extra_patterns[label])?;
            }
            engine.register_guardrail(stage, redactor)?;
            count += 1;
        }

        if self.profanity_filter.enabled {
            let mut filter = ProfanityFilter::new(self.profanity_filter.blocked_words.clone())?;
            for pattern in &self.profanity_filter.evasion_patterns {
                filter = filter.with_evasion_pattern(pattern)?;
            }
            engine.register_guardrail(stage, filter)?;
            count += 1;
        }

        if self.topic_filter.enabled {
            engine.register_guardrail(
                stage,
                TopicFilter::new(
                    self.topic_filter.allowed_topics.clone(),
                    self.topic_filter.keyword_lexicon.clone(),
                    self.topic_filter.max_drift_score,
                )?,
            )?;
            count += 1;
        }

        if self.repetition_filter.enabled {
            engine.register_guardrail(
                stage,
                RepetitionFilter::new(
                    self.repetition_filter.max_similarity,
                    self.repetition_filter.lookback_n,
                )?,
            )?;
            count += 1;
        }

        if self.schema_validator.enabled {
            engine.register_guardrail(
                stage,
                SchemaValidator::new(
                    self.schema_validator.required_fields.clone(),
                    self.schema_validator.field_types.clone(),
                    self.schema_validator.max_nesting_depth,
                )?,
            )?;
            count += 1;
        }

        if self.domain_allowlist.enabled {
            engine.register_guardrail(
                stage,
                DomainAllowlist::new(
                    self.domain_allowlist.allowed_domains.clone(),
                    self.domain_allowlist.max_calls_per_window,
                )?
                .with_window(Duration::from_secs(self.domain_allowlist.window_seconds)),
            )?;
            count += 1;
        }

        if self.resource_limiter.enabled {
            engine.register_guardrail(
                stage,
                ResourceLimiter::new(
                    self.resource_limiter.max_memory_bytes,
                    Duration::from_secs(self.resource_limiter.max_execution_seconds),
                )?,
            )?;
            count += 1;
        }

        if self.length_limiter.enabled {
            engine.register_guardrail(
                stage,
                LengthLimiter::new(self.length_limiter.max_length, self.length_limiter.min_length)?,
            )?;
            count += 1;
        }

        Ok(count)
    }
}

impl PipelineConfig {
    /// Build a validation engine from configuration
    ///
    /// Returns `None` when validation is disabled or no guardrail section is
    /// enabled. Invalid section values (bad regexes, zero thresholds)
    /// surface as construction errors here, never during validation.
    pub fn build_engine(&self) -> Result<Option<ValidationEngine>> {
        if !self.enabled {
            return Ok(None);
        }

        let mut engine = ValidationEngine::new().with_log_capacity(self.log_capacity);
        let mut count = 0;
        count += self.input.register_into(&mut engine, Stage::Input)?;
        count += self.output.register_into(&mut engine, Stage::Output)?;

        if count == 0 {
            Ok(None)
        } else {
            tracing::info!(
                "Built validation engine with {} guardrail(s) ({} input, {} output)",
                count,
                engine.guardrail_count(Stage::Input),
                engine.guardrail_count(Stage::Output)
            );
            Ok(Some(engine))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckContext;

    #[test]
    fn test_default_config_disabled() {
        let config = PipelineConfig::default();
        assert!(!config.enabled);
        assert!(config.build_engine().unwrap().is_none());
    }

    #[test]
    fn test_enabled_with_no_sections_builds_nothing() {
        let config = PipelineConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.build_engine().unwrap().is_none());
    }

    #[test]
    fn test_build_engine_with_sections() {
        let config = PipelineConfig {
            enabled: true,
            input: StageConfig {
                pii_redactor: PiiRedactorConfig {
                    enabled: true,
                    ..Default::default()
                },
                length_limiter: LengthLimiterConfig {
                    enabled: true,
                    max_length: 200,
                    min_length: 0,
                },
                ..Default::default()
            },
            output: StageConfig {
                profanity_filter: ProfanityFilterConfig {
                    enabled: true,
                    blocked_words: vec!["darn".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let engine = config.build_engine().unwrap().unwrap();
        assert_eq!(engine.guardrail_count(Stage::Input), 2);
        assert_eq!(engine.guardrail_count(Stage::Output), 1);
    }

    #[tokio::test]
    async fn test_registration_order_is_fixed() {
        let config = PipelineConfig {
            enabled: true,
            input: StageConfig {
                length_limiter: LengthLimiterConfig {
                    enabled: true,
                    ..Default::default()
                },
                pii_redactor: PiiRedactorConfig {
                    enabled: true,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let engine = config.build_engine().unwrap().unwrap();
        let run = engine
            .validate(Stage::Input, "hello", &CheckContext::default())
            .await;

        // PII redaction always precedes the length check
        assert_eq!(run.results[0].rule_name, "pii_redactor");
        assert_eq!(run.results[1].rule_name, "length_limiter");
    }

    #[test]
    fn test_invalid_section_surfaces_construction_error() {
        let config = PipelineConfig {
            enabled: true,
            input: StageConfig {
                rate_limiter: RateLimiterConfig {
                    enabled: true,
                    max_per_minute: 0,
                    max_per_hour: 10,
                },
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.build_engine().is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PipelineConfig {
            enabled: true,
            input: StageConfig {
                profanity_filter: ProfanityFilterConfig {
                    enabled: true,
                    blocked_words: vec!["bad".to_string()],
                    evasion_patterns: vec![r"b[a4]d".to_string()],
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert!(deserialized.input.profanity_filter.enabled);
        assert_eq!(deserialized.input.profanity_filter.blocked_words.len(), 1);
        assert_eq!(deserialized.log_capacity, DEFAULT_LOG_CAPACITY);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: PipelineConfig = serde_json::from_str(
            r#"{"enabled": true, "input": {"rate_limiter": {"enabled": true}}}"#,
        )
        .unwrap();

        assert_eq!(parsed.input.rate_limiter.max_per_minute, 60);
        assert_eq!(parsed.input.rate_limiter.max_per_hour, 1000);
        assert!(!parsed.output.rate_limiter.enabled);
    }
}

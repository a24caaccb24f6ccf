//! Guardrail Validation Engine
//!
//! Ordered content-policy checks for agent input and output, with verdict
//! aggregation, content rewriting, and a bounded execution log.
//!
//! # Example
//!
//! ```
//! use vetgate_guardrails::{LengthLimiter, PiiRedactor, Stage, ValidationEngine};
//!
//! fn main() -> Result<(), vetgate_guardrails::GuardrailError> {
//!     let engine = ValidationEngine::new()
//!         .with_input_guardrail(PiiRedactor::new()?)?
//!         .with_input_guardrail(LengthLimiter::new(500, 0)?)?;
//!
//!     assert_eq!(engine.guardrail_count(Stage::Input), 2);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod guardrail;
pub mod log;
pub mod result;
pub mod session;

// Built-in guardrails
pub mod domain_allowlist;
pub mod length_limiter;
pub mod pii_redactor;
pub mod profanity_filter;
pub mod rate_limiter;
pub mod repetition_filter;
pub mod resource_limiter;
pub mod schema_validator;
pub mod topic_filter;

mod text;

// Re-exports
pub use config::PipelineConfig;
pub use engine::{Stage, ValidationEngine, ValidationRun};
pub use error::{GuardrailError, Result};
pub use guardrail::{CheckContext, Guardrail, ResourceUsage};
pub use log::{ExecutionLog, ExecutionLogEntry, GuardrailStats, StatisticsSnapshot, DEFAULT_LOG_CAPACITY};
pub use result::{GuardrailResult, Severity};
pub use session::SessionEngines;

pub use domain_allowlist::DomainAllowlist;
pub use length_limiter::{LengthLimiter, TRUNCATION_MARKER};
pub use pii_redactor::PiiRedactor;
pub use profanity_filter::ProfanityFilter;
pub use rate_limiter::RateLimiter;
pub use repetition_filter::{RepetitionFilter, REPETITION_DISCLAIMER};
pub use resource_limiter::ResourceLimiter;
pub use schema_validator::{FieldType, SchemaValidator};
pub use topic_filter::TopicFilter;

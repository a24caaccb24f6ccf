//! Pipeline Telemetry
//!
//! Observability events for validation pipelines.
//!
//! # Example
//!
//! ```
//! use vetgate_telemetry::{PipelineEvent, TelemetryCollector};
//!
//! let telemetry = TelemetryCollector::new(1000);
//! let mut subscriber = telemetry.subscribe();
//!
//! telemetry.emit(PipelineEvent::validation_started("session-1", "input", 42));
//!
//! // Subscriber receives events
//! ```

pub mod collector;
pub mod event;

// Re-exports
pub use collector::TelemetryCollector;
pub use event::PipelineEvent;

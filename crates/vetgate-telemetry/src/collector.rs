//! Telemetry collector

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::PipelineEvent;

/// Telemetry collector for validation events
///
/// Collects and broadcasts events to subscribers.
/// Used for monitoring, logging, and debugging.
#[derive(Clone)]
pub struct TelemetryCollector {
    sender: Arc<broadcast::Sender<PipelineEvent>>,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    ///
    /// # Arguments
    /// * `capacity` - Channel capacity (default: 1000)
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit a telemetry event
    ///
    /// Events are broadcast to all subscribers.
    /// If no subscribers, events are dropped.
    pub fn emit(&self, event: PipelineEvent) {
        tracing::trace!(
            "Telemetry event: {} from {}",
            serde_json::to_string(&event).unwrap_or_default(),
            event.session_id()
        );

        // Send to all subscribers (ignore if no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to telemetry events
    ///
    /// Returns a receiver that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(1000)
    }
}

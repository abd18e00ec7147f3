use std::sync::Mutex;

use thiserror::Error;

use crate::envelope::EventEnvelope;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("event bus unavailable: {0}")]
    Unavailable(String),
}

/// Outbound seam to the event bus. The transport itself lives outside this
/// system; implementations only hand the envelope over.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), PublishError>;
}

/// Publisher that writes envelopes to the log, tagged with the configured
/// bus name. The default wiring when no real transport is attached.
pub struct LogPublisher {
    bus_name: String,
}

impl LogPublisher {
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
        }
    }
}

impl EventPublisher for LogPublisher {
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        let payload = serde_json::to_string(envelope)?;
        tracing::info!(
            bus = %self.bus_name,
            detail_type = %envelope.detail_type,
            payload = %payload,
            "publishing event"
        );
        Ok(())
    }
}

/// In-memory publisher for tests and local runs.
#[derive(Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<EventEnvelope>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything published so far.
    pub fn take(&self) -> Vec<EventEnvelope> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventPublisher for MemoryPublisher {
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        match self.events.lock() {
            Ok(mut events) => events.push(envelope.clone()),
            Err(poisoned) => poisoned.into_inner().push(envelope.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::detail_types;
    use serde_json::json;

    #[test]
    fn test_memory_publisher_collects_events() {
        let publisher = MemoryPublisher::new();
        let envelope = EventEnvelope::outbound(
            detail_types::BOOKING_CONFIRMED,
            &json!({"bookingId": "bkg_1"}),
        );
        publisher.publish(&envelope).unwrap();
        publisher.publish(&envelope).unwrap();

        let taken = publisher.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].detail_type, detail_types::BOOKING_CONFIRMED);
        assert!(publisher.take().is_empty());
    }

    #[test]
    fn test_log_publisher_accepts_envelope() {
        let publisher = LogPublisher::new("scheduling-events");
        let envelope =
            EventEnvelope::outbound(detail_types::BOOKING_FAILED, &json!({"error": "nope"}));
        assert!(publisher.publish(&envelope).is_ok());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Source stamped on every event this system emits.
pub const EVENT_SOURCE: &str = "scheduling";

/// The detail-type strings of the booking event surface.
pub mod detail_types {
    pub const BOOKING_REQUESTED: &str = "scheduling.booking_requested";
    pub const BOOKING_CONFIRMED: &str = "scheduling.booking_confirmed";
    pub const BOOKING_FAILED: &str = "scheduling.booking_failed";
    pub const CONSULTATION_REQUESTED: &str = "appointment.consultation_requested";
    pub const APPOINTMENT_SCHEDULED: &str = "appointment.scheduled";
    pub const APPOINTMENT_FAILED: &str = "appointment.failed";
}

/// Bus-level event envelope: `source`, `detail-type`, and a JSON `detail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub source: String,
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    pub detail: Value,
}

impl EventEnvelope {
    /// Build an outbound envelope from a typed detail payload. Payload types
    /// in this crate always encode; if one somehow does not, the envelope
    /// still goes out with the encoding failure recorded in its detail.
    pub fn outbound<T: Serialize>(detail_type: &str, detail: &T) -> Self {
        let detail = serde_json::to_value(detail).unwrap_or_else(|err| {
            tracing::error!(detail_type, error = %err, "failed to encode event detail");
            json!({ "error": format!("event detail encoding failed: {err}") })
        });
        Self {
            source: EVENT_SOURCE.to_string(),
            detail_type: detail_type.to_string(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip_uses_hyphenated_detail_type() {
        let envelope = EventEnvelope {
            source: "external-agent".to_string(),
            detail_type: detail_types::BOOKING_REQUESTED.to_string(),
            detail: json!({"tenantId": "tnt_1"}),
        };
        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(encoded["detail-type"], detail_types::BOOKING_REQUESTED);

        let decoded: EventEnvelope = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.detail_type, detail_types::BOOKING_REQUESTED);
        assert_eq!(decoded.detail["tenantId"], "tnt_1");
    }

    #[test]
    fn test_outbound_sets_source() {
        let envelope = EventEnvelope::outbound(
            detail_types::BOOKING_FAILED,
            &json!({"error": "Session not found"}),
        );
        assert_eq!(envelope.source, EVENT_SOURCE);
        assert_eq!(envelope.detail["error"], "Session not found");
    }
}

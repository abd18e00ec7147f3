//! The event worker: the second booking ingress.
//!
//! Consumes request events, drives the same booking engine as the HTTP
//! surface, and yields exactly one result event per inbound event. Every
//! failure, from a malformed payload to a full session, is absorbed into a
//! `_failed` event; nothing propagates back to the transport, because a
//! redelivered event risks a duplicate booking.

use events::{
    detail_types, BookingConfirmedDetail, BookingFailedDetail, BookingRequestedDetail,
    ConsultationRequestedDetail, EventEnvelope, SessionDetails,
};
use serde_json::{Map, Value};
use shared::types::{SessionId, SubjectId, TenantId};
use shared::{AppError, DomainError};
use tracing::{info, instrument, warn};

use crate::booking::{self, CreateBookingCommand};
use crate::metrics;
use crate::sessions;
use crate::state::AppState;

/// Handle one inbound event and produce its result event.
#[instrument(skip(state, envelope), fields(detail_type = %envelope.detail_type))]
pub async fn process_event(state: &AppState, envelope: &EventEnvelope) -> EventEnvelope {
    let result = match envelope.detail_type.as_str() {
        detail_types::BOOKING_REQUESTED => handle_booking_requested(state, &envelope.detail).await,
        detail_types::CONSULTATION_REQUESTED => {
            handle_consultation_requested(state, &envelope.detail).await
        }
        other => {
            warn!("unsupported detail-type");
            failed_envelope(
                detail_types::BOOKING_FAILED,
                &envelope.detail,
                format!("unsupported detail-type: {other}"),
            )
        }
    };
    let outcome = if result.detail_type.ends_with("failed") {
        "failed"
    } else {
        "confirmed"
    };
    metrics::record_event_processed(&envelope.detail_type, outcome);
    result
}

async fn handle_booking_requested(state: &AppState, detail: &Value) -> EventEnvelope {
    let parsed: BookingRequestedDetail = match serde_json::from_value(detail.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            return failed_envelope(
                detail_types::BOOKING_FAILED,
                detail,
                format!("invalid booking request: {err}"),
            );
        }
    };
    if parsed.tenant_id.trim().is_empty() || parsed.subject_id.trim().is_empty() {
        return failed_envelope(
            detail_types::BOOKING_FAILED,
            detail,
            "tenantId and subjectId are required".to_string(),
        );
    }
    let session_id: SessionId = match parsed.scheduling_data.session_id.parse() {
        Ok(session_id) => session_id,
        Err(err) => {
            return failed_envelope(
                detail_types::BOOKING_FAILED,
                detail,
                format!("invalid sessionId: {err}"),
            );
        }
    };

    let tenant_id = TenantId::from(parsed.tenant_id.clone());
    let subject_id = SubjectId::from(parsed.subject_id.clone());
    let mut extra = Map::new();
    if let Some(goal_id) = &parsed.goal_id {
        extra.insert("goalId".to_string(), Value::String(goal_id.clone()));
    }
    if let Some(booking_type) = &parsed.booking_type {
        extra.insert("bookingType".to_string(), Value::String(booking_type.clone()));
    }
    if let Some(contact) = &parsed.contact_info {
        if let Ok(value) = serde_json::to_value(contact) {
            extra.insert("contactInfo".to_string(), value);
        }
    }

    let cmd = CreateBookingCommand {
        session_id: session_id.clone(),
        subject_id,
        subject_type: booking::DEFAULT_SUBJECT_TYPE.to_string(),
        source: Some("event".to_string()),
        notes: None,
        extra: (!extra.is_empty()).then(|| Value::Object(extra)),
    };

    match execute(state, &tenant_id, &session_id, cmd).await {
        Ok((booking_id, session_details)) => {
            info!(booking_id = %booking_id, "emitting booking_confirmed");
            EventEnvelope::outbound(
                detail_types::BOOKING_CONFIRMED,
                &BookingConfirmedDetail {
                    tenant_id: parsed.tenant_id,
                    channel_id: parsed.channel_id,
                    subject_id: parsed.subject_id,
                    booking_id,
                    goal_id: parsed.goal_id,
                    session_details,
                },
            )
        }
        Err(err) => failed_envelope(detail_types::BOOKING_FAILED, detail, err.to_string()),
    }
}

async fn handle_consultation_requested(state: &AppState, detail: &Value) -> EventEnvelope {
    let parsed: ConsultationRequestedDetail = match serde_json::from_value(detail.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            return failed_envelope(
                detail_types::APPOINTMENT_FAILED,
                detail,
                format!("invalid consultation request: {err}"),
            );
        }
    };
    if parsed.tenant_id.trim().is_empty() || parsed.lead_id.trim().is_empty() {
        return failed_envelope(
            detail_types::APPOINTMENT_FAILED,
            detail,
            "tenantId and leadId are required".to_string(),
        );
    }
    let session_id: SessionId = match parsed.scheduling_data.session_id.parse() {
        Ok(session_id) => session_id,
        Err(err) => {
            return failed_envelope(
                detail_types::APPOINTMENT_FAILED,
                detail,
                format!("invalid sessionId: {err}"),
            );
        }
    };

    let tenant_id = TenantId::from(parsed.tenant_id.clone());
    let subject_id = SubjectId::from(parsed.lead_id.clone());
    let mut extra = Map::new();
    if let Some(goal_id) = &parsed.goal_id {
        extra.insert("goalId".to_string(), Value::String(goal_id.clone()));
    }
    if let Some(appointment_type) = &parsed.appointment_type {
        extra.insert(
            "appointmentType".to_string(),
            Value::String(appointment_type.clone()),
        );
    }
    if let Some(contact) = &parsed.contact_info {
        if let Ok(value) = serde_json::to_value(contact) {
            extra.insert("contactInfo".to_string(), value);
        }
    }

    let cmd = CreateBookingCommand {
        session_id: session_id.clone(),
        subject_id,
        subject_type: "LEAD".to_string(),
        source: Some("event".to_string()),
        notes: None,
        extra: (!extra.is_empty()).then(|| Value::Object(extra)),
    };

    match execute(state, &tenant_id, &session_id, cmd).await {
        Ok((booking_id, session_details)) => {
            info!(booking_id = %booking_id, "emitting appointment.scheduled");
            EventEnvelope::outbound(
                detail_types::APPOINTMENT_SCHEDULED,
                &BookingConfirmedDetail {
                    tenant_id: parsed.tenant_id,
                    channel_id: parsed.channel_id,
                    subject_id: parsed.lead_id,
                    booking_id,
                    goal_id: parsed.goal_id,
                    session_details,
                },
            )
        }
        Err(err) => failed_envelope(detail_types::APPOINTMENT_FAILED, detail, err.to_string()),
    }
}

/// Run the create protocol with the idempotent short-circuit: an existing
/// active booking for the subject yields a success carrying its id, and the
/// counter is not touched again.
async fn execute(
    state: &AppState,
    tenant_id: &TenantId,
    session_id: &SessionId,
    cmd: CreateBookingCommand,
) -> Result<(String, SessionDetails), AppError> {
    let booking_id = match booking::create_booking(&state.pool, tenant_id, cmd).await {
        Ok(booking) => booking.id.to_string(),
        Err(AppError::Domain(DomainError::AlreadyBooked { booking_id })) => {
            metrics::record_idempotency_hit(tenant_id.as_str());
            info!(booking_id = %booking_id, "duplicate request, reusing existing booking");
            booking_id
        }
        Err(err) => return Err(err),
    };

    let session = sessions::load_session(&state.pool, tenant_id, session_id).await?;
    let tz = domain::time::parse_timezone(&session.timezone).unwrap_or(chrono_tz::UTC);
    Ok((
        booking_id,
        SessionDetails {
            session_id: session.id.to_string(),
            date: session.date.to_string(),
            start_time: domain::time::format_local(session.start, tz, "%Y-%m-%dT%H:%M:%S%:z"),
            end_time: domain::time::format_local(session.end, tz, "%Y-%m-%dT%H:%M:%S%:z"),
            timezone: session.timezone,
            location_id: session.location_id.map(|id| id.to_string()),
            program_id: session.program_id.map(|id| id.to_string()),
        },
    ))
}

/// Build a `_failed` event, recovering whatever context the raw detail still
/// offers.
fn failed_envelope(detail_type: &str, raw: &Value, error: String) -> EventEnvelope {
    warn!(error = %error, "emitting failure event");
    let get = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .map(|value| value.to_string())
    };
    let session_id = raw
        .get("schedulingData")
        .and_then(|data| data.get("sessionId"))
        .and_then(Value::as_str)
        .map(|value| value.to_string());

    EventEnvelope::outbound(
        detail_type,
        &BookingFailedDetail {
            tenant_id: get("tenantId"),
            channel_id: get("channelId"),
            subject_id: get("subjectId").or_else(|| get("leadId")),
            session_id,
            error,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_envelope_recovers_context() {
        let raw = json!({
            "tenantId": "tnt_1",
            "channelId": "chan_4",
            "leadId": "lead_9",
            "schedulingData": { "sessionId": "sched_x#2025-01-06" }
        });
        let envelope = failed_envelope(
            detail_types::APPOINTMENT_FAILED,
            &raw,
            "Session not found: sched_x#2025-01-06".to_string(),
        );
        assert_eq!(envelope.detail_type, detail_types::APPOINTMENT_FAILED);
        assert_eq!(envelope.detail["tenantId"], "tnt_1");
        assert_eq!(envelope.detail["subjectId"], "lead_9");
        assert_eq!(envelope.detail["sessionId"], "sched_x#2025-01-06");
        assert_eq!(
            envelope.detail["error"],
            "Session not found: sched_x#2025-01-06"
        );
    }

    #[test]
    fn test_failed_envelope_without_context_still_carries_error() {
        let envelope = failed_envelope(
            detail_types::BOOKING_FAILED,
            &json!("not an object"),
            "invalid booking request".to_string(),
        );
        assert_eq!(envelope.detail["error"], "invalid booking request");
        assert!(envelope.detail.get("tenantId").is_none());
    }
}

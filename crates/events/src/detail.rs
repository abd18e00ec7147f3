//! Typed payloads for the inbound request events and the outbound result
//! events. Field names follow the wire convention (camelCase); unknown
//! fields on inbound payloads are ignored.

use serde::{Deserialize, Serialize};

/// Session reference carried inside a request event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingData {
    pub session_id: String,
}

/// Optional contact details forwarded with a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// `scheduling.booking_requested` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequestedDetail {
    pub tenant_id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    pub subject_id: String,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub booking_type: Option<String>,
    pub scheduling_data: SchedulingData,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

/// `appointment.consultation_requested` payload. The lead takes the subject
/// role on the resulting booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequestedDetail {
    pub tenant_id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    pub lead_id: String,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub appointment_type: Option<String>,
    pub scheduling_data: SchedulingData,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

/// Formatted session block included in success events. Start and end are
/// wall-clock strings in the session's zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub session_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
}

/// `scheduling.booking_confirmed` / `appointment.scheduled` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmedDetail {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub subject_id: String,
    pub booking_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    pub session_details: SessionDetails,
}

/// `scheduling.booking_failed` / `appointment.failed` payload. Context
/// fields are best-effort; only `error` is guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFailedDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booking_requested_parses_wire_shape() {
        let detail: BookingRequestedDetail = serde_json::from_value(json!({
            "tenantId": "tnt_1",
            "channelId": "chan_9",
            "subjectId": "member_7",
            "goalId": "goal_3",
            "schedulingData": { "sessionId": "sched_x#2025-01-06", "slotHint": "morning" },
            "contactInfo": { "email": "m@example.com" }
        }))
        .unwrap();
        assert_eq!(detail.tenant_id, "tnt_1");
        assert_eq!(detail.scheduling_data.session_id, "sched_x#2025-01-06");
        assert_eq!(detail.contact_info.unwrap().email.as_deref(), Some("m@example.com"));
    }

    #[test]
    fn test_booking_requested_requires_subject_and_session() {
        let missing_subject = serde_json::from_value::<BookingRequestedDetail>(json!({
            "tenantId": "tnt_1",
            "schedulingData": { "sessionId": "sched_x#2025-01-06" }
        }));
        assert!(missing_subject.is_err());

        let missing_session = serde_json::from_value::<BookingRequestedDetail>(json!({
            "tenantId": "tnt_1",
            "subjectId": "member_7"
        }));
        assert!(missing_session.is_err());
    }

    #[test]
    fn test_consultation_requested_parses() {
        let detail: ConsultationRequestedDetail = serde_json::from_value(json!({
            "tenantId": "tnt_1",
            "channelId": "chan_2",
            "leadId": "lead_5",
            "goalId": "goal_1",
            "appointmentType": "intro",
            "schedulingData": { "sessionId": "sched_x#2025-01-08" }
        }))
        .unwrap();
        assert_eq!(detail.lead_id, "lead_5");
        assert_eq!(detail.appointment_type.as_deref(), Some("intro"));
    }

    #[test]
    fn test_failed_detail_omits_absent_context() {
        let detail = BookingFailedDetail {
            tenant_id: None,
            channel_id: Some("chan_1".to_string()),
            subject_id: None,
            session_id: None,
            error: "Session not found: sched_x#2025-01-08".to_string(),
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["channelId"], "chan_1");
        assert!(value.get("tenantId").is_none());
        assert_eq!(value["error"], "Session not found: sched_x#2025-01-08");
    }
}

use serde::{Deserialize, Serialize};

use super::HostId;

/// Kind of time pattern a schedule describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    Session,
    Block,
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleType::Session => write!(f, "SESSION"),
            ScheduleType::Block => write!(f, "BLOCK"),
        }
    }
}

/// Attendance outcome for a booking on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    NoShow,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "PRESENT"),
            AttendanceStatus::Late => write!(f, "LATE"),
            AttendanceStatus::NoShow => write!(f, "NO_SHOW"),
        }
    }
}

/// How a check-in was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "check_in_method", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInMethod {
    Gps,
    Manual,
    Override,
}

impl std::fmt::Display for CheckInMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckInMethod::Gps => write!(f, "GPS"),
            CheckInMethod::Manual => write!(f, "MANUAL"),
            CheckInMethod::Override => write!(f, "OVERRIDE"),
        }
    }
}

/// Reference to a host assigned to a schedule. Hosts are ordered; the first
/// entry is the primary host used for host-indexed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRef {
    pub id: HostId,
    #[serde(rename = "type")]
    pub host_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_type_json_uses_upper_case() {
        assert_eq!(
            serde_json::to_string(&ScheduleType::Session).unwrap(),
            "\"SESSION\""
        );
        let parsed: ScheduleType = serde_json::from_str("\"BLOCK\"").unwrap();
        assert_eq!(parsed, ScheduleType::Block);
    }

    #[test]
    fn test_attendance_status_json() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::NoShow).unwrap(),
            "\"NO_SHOW\""
        );
    }

    #[test]
    fn test_host_ref_uses_type_field() {
        let host = HostRef {
            id: HostId::from("coach_1"),
            host_type: "USER".to_string(),
            role: Some("instructor".to_string()),
        };
        let json = serde_json::to_value(&host).unwrap();
        assert_eq!(json["type"], "USER");
        assert_eq!(json["id"], "coach_1");
    }
}

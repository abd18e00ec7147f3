use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{AttendanceStatus, BookingId, CheckInMethod, SessionId, SubjectId, TenantId};
use sqlx::FromRow;

/// Attendance record database model, one per booking. Created at first
/// check-in and afterwards only touched by administrative override.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub booking_id: BookingId,
    pub subject_id: SubjectId,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_in_method: CheckInMethod,
    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub distance_meters: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for writing an attendance record (check-in or override).
#[derive(Debug, Clone)]
pub struct RecordAttendance {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub booking_id: BookingId,
    pub subject_id: SubjectId,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_in_method: CheckInMethod,
    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub distance_meters: Option<f64>,
}

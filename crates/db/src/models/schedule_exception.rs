use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{HostRef, LocationId, ScheduleId, TenantId};
use sqlx::types::Json;
use sqlx::FromRow;

/// Kind of per-date override applied to one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exception_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    Cancelled,
    Override,
}

impl std::fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExceptionType::Cancelled => write!(f, "CANCELLED"),
            ExceptionType::Override => write!(f, "OVERRIDE"),
        }
    }
}

/// Schedule exception database model, keyed by the local occurrence date in
/// the schedule's timezone. Override datetimes are wall-clock values in the
/// schedule zone.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduleException {
    pub tenant_id: TenantId,
    pub schedule_id: ScheduleId,
    pub occurrence_date: NaiveDate,
    pub exception_type: ExceptionType,
    pub override_start: Option<NaiveDateTime>,
    pub override_end: Option<NaiveDateTime>,
    pub override_capacity: Option<i32>,
    pub override_hosts: Option<Json<Vec<HostRef>>>,
    pub override_location_id: Option<LocationId>,
    pub extra: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new schedule exception
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleException {
    pub tenant_id: TenantId,
    pub schedule_id: ScheduleId,
    pub occurrence_date: NaiveDate,
    pub exception_type: ExceptionType,
    pub override_start: Option<NaiveDateTime>,
    pub override_end: Option<NaiveDateTime>,
    pub override_capacity: Option<i32>,
    pub override_hosts: Option<Vec<HostRef>>,
    pub override_location_id: Option<LocationId>,
    pub extra: Option<serde_json::Value>,
}

/// Input for updating a schedule exception; absent fields are unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScheduleException {
    pub exception_type: Option<ExceptionType>,
    pub override_start: Option<NaiveDateTime>,
    pub override_end: Option<NaiveDateTime>,
    pub override_capacity: Option<i32>,
    pub override_hosts: Option<Vec<HostRef>>,
    pub override_location_id: Option<LocationId>,
    pub extra: Option<serde_json::Value>,
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{HostRef, LocationId, ProgramId, ScheduleId, ScheduleType, TenantId};
use sqlx::types::Json;
use sqlx::FromRow;

/// Schedule database model: a time pattern whose occurrences become virtual
/// sessions. `start_time`/`end_time` are local wall-clock values in
/// `timezone`, never UTC.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub tenant_id: TenantId,
    pub id: ScheduleId,
    pub schedule_type: ScheduleType,
    pub program_id: Option<ProgramId>,
    pub name: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub timezone: String,
    pub is_recurring: bool,
    pub rrule: Option<String>,
    pub base_capacity: Option<i32>,
    pub hosts: Json<Vec<HostRef>>,
    /// First host's id, denormalized for host-indexed lookup.
    pub primary_host_id: Option<String>,
    pub location_id: Option<LocationId>,
    pub tags: Vec<String>,
    pub extra: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn hosts(&self) -> &[HostRef] {
        &self.hosts.0
    }
}

/// Input for creating a new schedule
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSchedule {
    pub tenant_id: TenantId,
    pub schedule_type: ScheduleType,
    pub program_id: Option<ProgramId>,
    pub name: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub timezone: String,
    pub is_recurring: bool,
    pub rrule: Option<String>,
    pub base_capacity: Option<i32>,
    pub hosts: Vec<HostRef>,
    pub location_id: Option<LocationId>,
    pub tags: Vec<String>,
    pub extra: Option<serde_json::Value>,
}

/// Input for updating a schedule; absent fields are unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSchedule {
    pub program_id: Option<ProgramId>,
    pub name: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub timezone: Option<String>,
    pub is_recurring: Option<bool>,
    pub rrule: Option<String>,
    pub base_capacity: Option<i32>,
    pub hosts: Option<Vec<HostRef>>,
    pub location_id: Option<LocationId>,
    pub tags: Option<Vec<String>>,
    pub extra: Option<serde_json::Value>,
}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use db::models::{CreateSchedule, Schedule, UpdateSchedule};
use db::ScheduleRepository;
use domain::recurrence::RecurrenceRule;
use domain::time;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::{HostId, HostRef, LocationId, ProgramId, ScheduleId, ScheduleType};
use shared::{AppError, DomainError};
use validator::Validate;

use crate::{
    auth::TenantContext,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulesQuery {
    pub schedule_id: Option<String>,
    pub program_id: Option<String>,
    pub host_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub program_id: Option<String>,
    pub name: Option<String>,
    /// Local wall-clock datetime in `timezone`.
    pub start: String,
    pub end: String,
    pub timezone: String,
    #[serde(default)]
    pub is_recurring: bool,
    pub rrule: Option<String>,
    #[validate(range(min = 0))]
    pub base_capacity: Option<i32>,
    #[serde(default)]
    pub hosts: Vec<HostRef>,
    pub location_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub extra: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub schedule_id: String,
    pub program_id: Option<String>,
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub timezone: Option<String>,
    pub is_recurring: Option<bool>,
    pub rrule: Option<String>,
    #[validate(range(min = 0))]
    pub base_capacity: Option<i32>,
    pub hosts: Option<Vec<HostRef>>,
    pub location_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub extra: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule_id: String,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub program_id: Option<String>,
    pub name: Option<String>,
    pub start: String,
    pub end: String,
    pub timezone: String,
    pub is_recurring: bool,
    pub rrule: Option<String>,
    pub base_capacity: Option<i32>,
    pub hosts: Vec<HostRef>,
    pub location_id: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Schedule> for ScheduleResponse {
    fn from(schedule: Schedule) -> Self {
        Self {
            schedule_id: schedule.id.to_string(),
            schedule_type: schedule.schedule_type,
            program_id: schedule.program_id.map(|id| id.to_string()),
            name: schedule.name,
            start: format_wall_clock(schedule.start_time),
            end: format_wall_clock(schedule.end_time),
            timezone: schedule.timezone,
            is_recurring: schedule.is_recurring,
            rrule: schedule.rrule,
            base_capacity: schedule.base_capacity,
            hosts: schedule.hosts.0,
            location_id: schedule.location_id.map(|id| id.to_string()),
            tags: schedule.tags,
            extra: schedule.extra.map(|json| json.0),
            created_at: schedule.created_at.to_rfc3339(),
            updated_at: schedule.updated_at.to_rfc3339(),
        }
    }
}

fn format_wall_clock(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a request datetime and pin it to the schedule zone's wall clock.
fn parse_wall_clock(input: &str, tz: Tz) -> Result<NaiveDateTime, ApiError> {
    let instant = time::parse_local(input, tz)?;
    Ok(time::absolute_to_naive(instant, tz))
}

/// GET /scheduling/schedules - by id, by program, by host, or all
pub async fn get_schedules(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SchedulesQuery>,
) -> ApiResult<Json<Value>> {
    if let Some(id) = query.schedule_id {
        let schedule_id = ScheduleId::from(id.as_str());
        let schedule = ScheduleRepository::find_by_id(&state.pool, &tenant.tenant_id, &schedule_id)
            .await?
            .ok_or_else(|| ApiError::from(DomainError::ScheduleNotFound(id)))?;
        return Ok(Json(serde_json::json!(ScheduleResponse::from(schedule))));
    }

    let schedules = if let Some(program_id) = query.program_id {
        let ids: Vec<ProgramId> = program_id
            .split(',')
            .filter(|s| !s.is_empty())
            .map(ProgramId::from)
            .collect();
        ScheduleRepository::list_by_programs(&state.pool, &tenant.tenant_id, &ids).await?
    } else if let Some(host_id) = query.host_id {
        ScheduleRepository::list_by_primary_host(
            &state.pool,
            &tenant.tenant_id,
            &HostId::from(host_id.as_str()),
        )
        .await?
    } else {
        ScheduleRepository::list(&state.pool, &tenant.tenant_id).await?
    };

    let responses: Vec<ScheduleResponse> =
        schedules.into_iter().map(ScheduleResponse::from).collect();
    Ok(Json(serde_json::json!(responses)))
}

/// POST /scheduling/schedules
pub async fn create_schedule(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateScheduleRequest>,
) -> ApiResult<(StatusCode, Json<ScheduleResponse>)> {
    req.validate()
        .map_err(|err| ApiError::from(AppError::Validation(err.to_string())))?;

    if req.schedule_type == ScheduleType::Session && req.program_id.is_none() {
        return Err(ApiError::from(AppError::Validation(
            "SESSION schedules require a programId".to_string(),
        )));
    }
    if req.is_recurring && req.rrule.is_none() {
        return Err(ApiError::from(AppError::Validation(
            "recurring schedules require an rrule".to_string(),
        )));
    }
    if !req.is_recurring && req.rrule.is_some() {
        return Err(ApiError::from(AppError::Validation(
            "rrule requires isRecurring".to_string(),
        )));
    }
    if let Some(rule) = &req.rrule {
        RecurrenceRule::parse(rule).map_err(ApiError::from)?;
    }

    let tz = time::parse_timezone(&req.timezone).map_err(ApiError::from)?;
    let start_time = parse_wall_clock(&req.start, tz)?;
    let end_time = parse_wall_clock(&req.end, tz)?;
    if time::naive_to_absolute(end_time, tz) <= time::naive_to_absolute(start_time, tz) {
        return Err(ApiError::from(AppError::Validation(
            "end must be after start".to_string(),
        )));
    }

    let schedule = ScheduleRepository::create(
        &state.pool,
        CreateSchedule {
            tenant_id: tenant.tenant_id,
            schedule_type: req.schedule_type,
            program_id: req.program_id.map(|id| ProgramId::from(id.as_str())),
            name: req.name,
            start_time,
            end_time,
            timezone: req.timezone,
            is_recurring: req.is_recurring,
            rrule: req.rrule,
            base_capacity: req.base_capacity,
            hosts: req.hosts,
            location_id: req.location_id.map(|id| LocationId::from(id.as_str())),
            tags: req.tags,
            extra: req.extra,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ScheduleResponse::from(schedule))))
}

/// PATCH /scheduling/schedules - id travels in the body
pub async fn update_schedule(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<UpdateScheduleRequest>,
) -> ApiResult<Json<ScheduleResponse>> {
    req.validate()
        .map_err(|err| ApiError::from(AppError::Validation(err.to_string())))?;

    let schedule_id = ScheduleId::from(req.schedule_id.as_str());
    let existing = ScheduleRepository::find_by_id(&state.pool, &tenant.tenant_id, &schedule_id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::ScheduleNotFound(req.schedule_id.clone())))?;

    // Validate against the combined (existing + patch) state.
    let timezone = req.timezone.clone().unwrap_or(existing.timezone);
    let tz = time::parse_timezone(&timezone).map_err(ApiError::from)?;
    let start_time = match &req.start {
        Some(start) => Some(parse_wall_clock(start, tz)?),
        None => None,
    };
    let end_time = match &req.end {
        Some(end) => Some(parse_wall_clock(end, tz)?),
        None => None,
    };
    let effective_start = start_time.unwrap_or(existing.start_time);
    let effective_end = end_time.unwrap_or(existing.end_time);
    if time::naive_to_absolute(effective_end, tz) <= time::naive_to_absolute(effective_start, tz) {
        return Err(ApiError::from(AppError::Validation(
            "end must be after start".to_string(),
        )));
    }

    let is_recurring = req.is_recurring.unwrap_or(existing.is_recurring);
    let rrule = req.rrule.clone().or(existing.rrule);
    if is_recurring {
        let rule = rrule.as_deref().ok_or_else(|| {
            ApiError::from(AppError::Validation(
                "recurring schedules require an rrule".to_string(),
            ))
        })?;
        RecurrenceRule::parse(rule).map_err(ApiError::from)?;
    }

    let schedule = ScheduleRepository::update(
        &state.pool,
        &tenant.tenant_id,
        &schedule_id,
        UpdateSchedule {
            program_id: req.program_id.map(|id| ProgramId::from(id.as_str())),
            name: req.name,
            start_time,
            end_time,
            timezone: req.timezone,
            is_recurring: req.is_recurring,
            rrule: req.rrule,
            base_capacity: req.base_capacity,
            hosts: req.hosts,
            location_id: req.location_id.map(|id| LocationId::from(id.as_str())),
            tags: req.tags,
            extra: req.extra,
        },
    )
    .await?
    .ok_or_else(|| ApiError::from(DomainError::ScheduleNotFound(req.schedule_id)))?;

    Ok(Json(ScheduleResponse::from(schedule)))
}

/// DELETE /scheduling/schedules?scheduleId=
pub async fn delete_schedule(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SchedulesQuery>,
) -> ApiResult<Json<ScheduleResponse>> {
    let id = query.schedule_id.ok_or_else(|| {
        ApiError::from(AppError::Validation("scheduleId is required".to_string()))
    })?;
    let schedule_id = ScheduleId::from(id.as_str());
    let schedule = ScheduleRepository::delete(&state.pool, &tenant.tenant_id, &schedule_id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::ScheduleNotFound(id)))?;

    Ok(Json(ScheduleResponse::from(schedule)))
}

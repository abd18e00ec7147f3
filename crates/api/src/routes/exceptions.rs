use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use db::models::{
    CreateScheduleException, ExceptionType, ScheduleException, UpdateScheduleException,
};
use db::{ScheduleExceptionRepository, ScheduleRepository};
use domain::time;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::{HostRef, LocationId, ScheduleId};
use shared::{AppError, DomainError};

use crate::{
    auth::TenantContext,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionsQuery {
    pub schedule_id: Option<String>,
    pub occurrence_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExceptionRequest {
    pub schedule_id: String,
    pub occurrence_date: NaiveDate,
    #[serde(rename = "type")]
    pub exception_type: ExceptionType,
    pub override_start: Option<String>,
    pub override_end: Option<String>,
    pub override_capacity: Option<i32>,
    pub override_hosts: Option<Vec<HostRef>>,
    pub override_location_id: Option<String>,
    pub extra: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExceptionRequest {
    pub schedule_id: String,
    pub occurrence_date: NaiveDate,
    #[serde(rename = "type")]
    pub exception_type: Option<ExceptionType>,
    pub override_start: Option<String>,
    pub override_end: Option<String>,
    pub override_capacity: Option<i32>,
    pub override_hosts: Option<Vec<HostRef>>,
    pub override_location_id: Option<String>,
    pub extra: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionResponse {
    pub schedule_id: String,
    pub occurrence_date: String,
    #[serde(rename = "type")]
    pub exception_type: ExceptionType,
    pub override_start: Option<String>,
    pub override_end: Option<String>,
    pub override_capacity: Option<i32>,
    pub override_hosts: Option<Vec<HostRef>>,
    pub override_location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ScheduleException> for ExceptionResponse {
    fn from(exception: ScheduleException) -> Self {
        Self {
            schedule_id: exception.schedule_id.to_string(),
            occurrence_date: exception.occurrence_date.to_string(),
            exception_type: exception.exception_type,
            override_start: exception.override_start.map(format_wall_clock),
            override_end: exception.override_end.map(format_wall_clock),
            override_capacity: exception.override_capacity,
            override_hosts: exception.override_hosts.map(|hosts| hosts.0),
            override_location_id: exception.override_location_id.map(|id| id.to_string()),
            extra: exception.extra.map(|json| json.0),
            created_at: exception.created_at.to_rfc3339(),
            updated_at: exception.updated_at.to_rfc3339(),
        }
    }
}

fn format_wall_clock(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn parse_override(input: Option<&str>, tz: Tz) -> Result<Option<NaiveDateTime>, ApiError> {
    match input {
        Some(raw) => {
            let instant = time::parse_local(raw, tz)?;
            Ok(Some(time::absolute_to_naive(instant, tz)))
        }
        None => Ok(None),
    }
}

/// Look up the parent schedule; exceptions cannot dangle off a missing one.
async fn schedule_zone(
    state: &AppState,
    tenant: &TenantContext,
    schedule_id: &ScheduleId,
) -> Result<Tz, ApiError> {
    let schedule = ScheduleRepository::find_by_id(&state.pool, &tenant.tenant_id, schedule_id)
        .await?
        .ok_or_else(|| {
            ApiError::from(DomainError::ScheduleNotFound(schedule_id.to_string()))
        })?;
    time::parse_timezone(&schedule.timezone).map_err(ApiError::from)
}

/// GET /scheduling/exceptions?scheduleId=&occurrenceDate=|startDate=&endDate=
pub async fn get_exceptions(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ExceptionsQuery>,
) -> ApiResult<Json<Value>> {
    let schedule_id = query.schedule_id.ok_or_else(|| {
        ApiError::from(AppError::Validation("scheduleId is required".to_string()))
    })?;
    let schedule_id = ScheduleId::from(schedule_id.as_str());

    if let Some(date) = query.occurrence_date {
        let exception =
            ScheduleExceptionRepository::find(&state.pool, &tenant.tenant_id, &schedule_id, date)
                .await?
                .ok_or_else(|| {
                    ApiError::from(DomainError::ExceptionNotFound(format!(
                        "{schedule_id}#{date}"
                    )))
                })?;
        return Ok(Json(serde_json::json!(ExceptionResponse::from(exception))));
    }

    let exceptions = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            ScheduleExceptionRepository::list_in_range(
                &state.pool,
                &tenant.tenant_id,
                &schedule_id,
                start,
                end,
            )
            .await?
        }
        _ => {
            ScheduleExceptionRepository::list_for_schedule(
                &state.pool,
                &tenant.tenant_id,
                &schedule_id,
            )
            .await?
        }
    };
    let responses: Vec<ExceptionResponse> =
        exceptions.into_iter().map(ExceptionResponse::from).collect();
    Ok(Json(serde_json::json!(responses)))
}

/// POST /scheduling/exceptions
pub async fn create_exception(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateExceptionRequest>,
) -> ApiResult<(StatusCode, Json<ExceptionResponse>)> {
    let schedule_id = ScheduleId::from(req.schedule_id.as_str());
    let tz = schedule_zone(&state, &tenant, &schedule_id).await?;

    let exception = ScheduleExceptionRepository::upsert(
        &state.pool,
        CreateScheduleException {
            tenant_id: tenant.tenant_id,
            schedule_id,
            occurrence_date: req.occurrence_date,
            exception_type: req.exception_type,
            override_start: parse_override(req.override_start.as_deref(), tz)?,
            override_end: parse_override(req.override_end.as_deref(), tz)?,
            override_capacity: req.override_capacity,
            override_hosts: req.override_hosts,
            override_location_id: req
                .override_location_id
                .map(|id| LocationId::from(id.as_str())),
            extra: req.extra,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ExceptionResponse::from(exception))))
}

/// PATCH /scheduling/exceptions - key travels in the body
pub async fn update_exception(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<UpdateExceptionRequest>,
) -> ApiResult<Json<ExceptionResponse>> {
    let schedule_id = ScheduleId::from(req.schedule_id.as_str());
    let tz = schedule_zone(&state, &tenant, &schedule_id).await?;

    let exception = ScheduleExceptionRepository::update(
        &state.pool,
        &tenant.tenant_id,
        &schedule_id,
        req.occurrence_date,
        UpdateScheduleException {
            exception_type: req.exception_type,
            override_start: parse_override(req.override_start.as_deref(), tz)?,
            override_end: parse_override(req.override_end.as_deref(), tz)?,
            override_capacity: req.override_capacity,
            override_hosts: req.override_hosts,
            override_location_id: req
                .override_location_id
                .map(|id| LocationId::from(id.as_str())),
            extra: req.extra,
        },
    )
    .await?
    .ok_or_else(|| {
        ApiError::from(DomainError::ExceptionNotFound(format!(
            "{}#{}",
            req.schedule_id, req.occurrence_date
        )))
    })?;

    Ok(Json(ExceptionResponse::from(exception)))
}

/// DELETE /scheduling/exceptions?scheduleId=&occurrenceDate=
pub async fn delete_exception(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ExceptionsQuery>,
) -> ApiResult<Json<ExceptionResponse>> {
    let schedule_id = query.schedule_id.ok_or_else(|| {
        ApiError::from(AppError::Validation("scheduleId is required".to_string()))
    })?;
    let date = query.occurrence_date.ok_or_else(|| {
        ApiError::from(AppError::Validation(
            "occurrenceDate is required".to_string(),
        ))
    })?;
    let schedule_id = ScheduleId::from(schedule_id.as_str());

    let exception =
        ScheduleExceptionRepository::delete(&state.pool, &tenant.tenant_id, &schedule_id, date)
            .await?
            .ok_or_else(|| {
                ApiError::from(DomainError::ExceptionNotFound(format!(
                    "{schedule_id}#{date}"
                )))
            })?;

    Ok(Json(ExceptionResponse::from(exception)))
}

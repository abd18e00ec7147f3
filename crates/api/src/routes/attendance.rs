use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::DateTime;
use db::models::AttendanceRecord;
use db::AttendanceRepository;
use serde::{Deserialize, Serialize};
use shared::types::{AttendanceStatus, BookingId, CheckInMethod, SessionId};
use shared::AppError;

use crate::{
    auth::{SubjectContext, TenantContext},
    checkin::{self, CheckInCommand},
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub booking_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// ISO-8601 with offset; defaults to now.
    pub check_in_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideAttendanceRequest {
    pub session_id: String,
    pub booking_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub session_id: String,
    pub booking_id: String,
    pub subject_id: String,
    pub status: AttendanceStatus,
    pub check_in_time: Option<String>,
    pub check_in_method: CheckInMethod,
    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub distance_meters: Option<f64>,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            session_id: record.session_id.to_string(),
            booking_id: record.booking_id.to_string(),
            subject_id: record.subject_id.to_string(),
            status: record.status,
            check_in_time: record.check_in_time.map(|at| at.to_rfc3339()),
            check_in_method: record.check_in_method,
            check_in_latitude: record.check_in_latitude,
            check_in_longitude: record.check_in_longitude,
            distance_meters: record.distance_meters,
        }
    }
}

/// GET /scheduling/attendance - session roster, or the caller's history
pub async fn list_attendance(
    State(state): State<AppState>,
    tenant: TenantContext,
    subject: SubjectContext,
    Query(query): Query<AttendanceQuery>,
) -> ApiResult<Json<Vec<AttendanceResponse>>> {
    let records = match query.session_id {
        Some(raw) => {
            let session_id: SessionId = raw
                .parse()
                .map_err(|err: shared::types::SessionIdError| {
                    ApiError::from(AppError::Validation(err.to_string()))
                })?;
            AttendanceRepository::list_by_session(&state.pool, &tenant.tenant_id, &session_id)
                .await?
        }
        None => {
            let subject_id = subject.subject_id.ok_or_else(|| {
                ApiError::from(AppError::Validation(
                    "subjectId is required without sessionId".to_string(),
                ))
            })?;
            AttendanceRepository::list_by_subject(&state.pool, &tenant.tenant_id, &subject_id)
                .await?
        }
    };

    Ok(Json(records.into_iter().map(AttendanceResponse::from).collect()))
}

/// POST /scheduling/attendance - check in
pub async fn create_check_in(
    State(state): State<AppState>,
    tenant: TenantContext,
    subject: SubjectContext,
    Json(req): Json<CheckInRequest>,
) -> ApiResult<(StatusCode, Json<AttendanceResponse>)> {
    let check_in_time = match req.check_in_time.as_deref() {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|_| {
                    ApiError::from(AppError::Validation(format!(
                        "invalid checkInTime '{raw}'"
                    )))
                })?
                .with_timezone(&chrono::Utc),
        ),
        None => None,
    };

    let record = checkin::create_check_in(
        &state.pool,
        &state.check_in_window,
        &tenant.tenant_id,
        subject.subject_id.as_ref(),
        CheckInCommand {
            booking_id: BookingId::from(req.booking_id.as_str()),
            latitude: req.latitude,
            longitude: req.longitude,
            check_in_time,
        },
    )
    .await
    .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(AttendanceResponse::from(record))))
}

/// PATCH /scheduling/attendance - administrative override
pub async fn override_attendance(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<OverrideAttendanceRequest>,
) -> ApiResult<Json<AttendanceResponse>> {
    let session_id: SessionId = req
        .session_id
        .parse()
        .map_err(|err: shared::types::SessionIdError| {
            ApiError::from(AppError::Validation(err.to_string()))
        })?;

    let record = checkin::override_attendance(
        &state.pool,
        &tenant.tenant_id,
        &session_id,
        &BookingId::from(req.booking_id.as_str()),
        req.status,
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(AttendanceResponse::from(record)))
}

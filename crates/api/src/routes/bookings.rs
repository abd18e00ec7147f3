use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use db::models::{Booking, BookingStatus};
use db::BookingRepository;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::types::{BookingId, SessionId, SubjectId};
use shared::AppError;

use crate::{
    auth::{SubjectContext, TenantContext},
    booking::{self, CreateBookingCommand},
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_SUBJECT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsQuery {
    pub session_id: Option<String>,
    pub booking_id: Option<String>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub session_id: String,
    pub subject_id: Option<String>,
    pub subject_type: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    /// Unknown fields land here instead of being silently stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: String,
    pub session_id: String,
    pub subject_id: String,
    pub subject_type: String,
    pub status: BookingStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub created_at: String,
    pub cancelled_at: Option<String>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.id.to_string(),
            session_id: booking.session_id.to_string(),
            subject_id: booking.subject_id.to_string(),
            subject_type: booking.subject_type,
            status: booking.status,
            source: booking.source,
            notes: booking.notes,
            extra: booking.extra.map(|json| json.0),
            created_at: booking.created_at.to_rfc3339(),
            cancelled_at: booking.cancelled_at.map(|at| at.to_rfc3339()),
        }
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|err: shared::types::SessionIdError| {
            ApiError::from(AppError::Validation(err.to_string()))
        })
}

fn parse_status(raw: &str) -> Result<BookingStatus, ApiError> {
    serde_json::from_value(Value::String(raw.to_string())).map_err(|_| {
        ApiError::from(AppError::Validation(format!(
            "invalid status filter '{raw}'"
        )))
    })
}

/// GET /scheduling/bookings - by session, or scoped to the calling subject
pub async fn list_bookings(
    State(state): State<AppState>,
    tenant: TenantContext,
    subject: SubjectContext,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = match query.session_id {
        Some(raw) => {
            let session_id = parse_session_id(&raw)?;
            BookingRepository::list_by_session(&state.pool, &tenant.tenant_id, &session_id).await?
        }
        None => {
            let subject_id = subject.subject_id.ok_or_else(|| {
                ApiError::from(AppError::Validation(
                    "subjectId is required without sessionId".to_string(),
                ))
            })?;
            let status = query.status.as_deref().map(parse_status).transpose()?;
            let limit = query.limit.unwrap_or(DEFAULT_SUBJECT_LIMIT).clamp(1, 500);
            BookingRepository::list_by_subject(
                &state.pool,
                &tenant.tenant_id,
                &subject_id,
                status,
                limit,
            )
            .await?
        }
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// POST /scheduling/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    tenant: TenantContext,
    subject: SubjectContext,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<BookingResponse>)> {
    let session_id = parse_session_id(&req.session_id)?;
    let subject_id = subject
        .subject_id
        .or(req.subject_id.map(|id| SubjectId::from(id.as_str())))
        .ok_or_else(|| {
            ApiError::from(AppError::Validation("subjectId is required".to_string()))
        })?;

    let booking = booking::create_booking(
        &state.pool,
        &tenant.tenant_id,
        CreateBookingCommand {
            session_id,
            subject_id,
            subject_type: req
                .subject_type
                .unwrap_or_else(|| booking::DEFAULT_SUBJECT_TYPE.to_string()),
            source: req.source,
            notes: req.notes,
            extra: (!req.extra.is_empty()).then(|| Value::Object(req.extra)),
        },
    )
    .await
    .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// DELETE /scheduling/bookings?bookingId= - cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    tenant: TenantContext,
    subject: SubjectContext,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Json<BookingResponse>> {
    let raw = query.booking_id.ok_or_else(|| {
        ApiError::from(AppError::Validation("bookingId is required".to_string()))
    })?;
    let booking_id = BookingId::from(raw.as_str());

    let cancelled = booking::cancel_booking(
        &state.pool,
        &tenant.tenant_id,
        &booking_id,
        subject.subject_id.as_ref(),
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(BookingResponse::from(cancelled)))
}

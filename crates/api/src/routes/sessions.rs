use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use domain::session::{SessionFilter, SessionInstance};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::{HostId, HostRef, LocationId, ProgramId, ScheduleType, SessionId};
use shared::AppError;

use crate::{
    auth::TenantContext,
    error::{ApiError, ApiResult},
    sessions::{self, SessionQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsQuery {
    pub session_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Exact id or comma-separated set.
    pub program_id: Option<String>,
    #[serde(rename = "type")]
    pub schedule_type: Option<ScheduleType>,
    pub host_id: Option<String>,
    pub location_id: Option<String>,
    /// HH:MM bounds evaluated against the local wall-clock start.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub schedule_id: String,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub program_id: Option<String>,
    pub location_id: Option<String>,
    pub date: String,
    pub start: String,
    pub end: String,
    pub timezone: String,
    pub hosts: Vec<HostRef>,
    pub tags: Vec<String>,
    pub capacity: Option<i32>,
    pub booked_count: i32,
    pub waitlist_count: i32,
}

impl From<SessionInstance> for SessionResponse {
    fn from(session: SessionInstance) -> Self {
        Self {
            session_id: session.id.to_string(),
            schedule_id: session.schedule_id.to_string(),
            schedule_type: session.schedule_type,
            program_id: session.program_id.map(|id| id.to_string()),
            location_id: session.location_id.map(|id| id.to_string()),
            date: session.date.to_string(),
            start: session.start.to_rfc3339(),
            end: session.end.to_rfc3339(),
            timezone: session.timezone,
            hosts: session.hosts,
            tags: session.tags,
            capacity: session.capacity,
            booked_count: session.booked_count,
            waitlist_count: session.waitlist_count,
        }
    }
}

fn parse_hhmm(input: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(input, "%H:%M").map_err(|_| {
        ApiError::from(AppError::Validation(format!(
            "invalid time filter '{input}', expected HH:MM"
        )))
    })
}

/// GET /scheduling/sessions - a single virtual session or a filtered window
pub async fn get_sessions(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SessionsQuery>,
) -> ApiResult<Json<Value>> {
    if let Some(raw) = query.session_id {
        let session_id: SessionId = raw
            .parse()
            .map_err(|err: shared::types::SessionIdError| {
                ApiError::from(AppError::Validation(err.to_string()))
            })?;
        let session = sessions::load_session(&state.pool, &tenant.tenant_id, &session_id).await?;
        return Ok(Json(serde_json::json!(SessionResponse::from(session))));
    }

    let (start_date, end_date) = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ApiError::from(AppError::Validation(
                "startDate and endDate are required unless sessionId is given".to_string(),
            )));
        }
    };

    let filter = SessionFilter {
        program_ids: query.program_id.map(|raw| {
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(ProgramId::from)
                .collect()
        }),
        schedule_type: query.schedule_type,
        host_id: query.host_id.map(|id| HostId::from(id.as_str())),
        location_id: query.location_id.map(|id| LocationId::from(id.as_str())),
        start_time: query.start_time.as_deref().map(parse_hhmm).transpose()?,
        end_time: query.end_time.as_deref().map(parse_hhmm).transpose()?,
    };

    let result = sessions::query_sessions(
        &state.pool,
        &tenant.tenant_id,
        SessionQuery {
            start_date,
            end_date,
            filter,
        },
    )
    .await?;

    let responses: Vec<SessionResponse> =
        result.into_iter().map(SessionResponse::from).collect();
    Ok(Json(serde_json::json!(responses)))
}

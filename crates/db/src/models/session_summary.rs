use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{SessionId, TenantId};
use sqlx::FromRow;

/// Persistent shadow of a virtual session's mutable counters. The row is
/// created by the first reservation against the session; `capacity` tracks
/// the most recently observed resolved capacity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionSummary {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub capacity: Option<i32>,
    pub booked_count: i32,
    pub waitlist_count: i32,
    /// Local occurrence date, set when the row is first created.
    pub session_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

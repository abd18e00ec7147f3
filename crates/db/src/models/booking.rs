use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{BookingId, SessionId, SubjectId, TenantId};
use sqlx::types::Json;
use sqlx::FromRow;

/// Booking status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Waitlist,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
            BookingStatus::Waitlist => write!(f, "WAITLIST"),
        }
    }
}

/// Booking database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub id: BookingId,
    pub subject_id: SubjectId,
    pub subject_type: String,
    pub status: BookingStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub extra: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Active bookings hold a seat on the session.
    pub fn is_active(&self) -> bool {
        matches!(self.status, BookingStatus::Confirmed | BookingStatus::Waitlist)
    }

    pub fn can_cancel(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Input for creating a new booking
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub subject_id: SubjectId,
    pub subject_type: String,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub extra: Option<serde_json::Value>,
}

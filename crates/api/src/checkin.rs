//! The check-in service: composes the attendance validators with booking,
//! session, and location state.

use chrono::{DateTime, Utc};
use db::models::{AttendanceRecord, BookingStatus, RecordAttendance};
use db::{AttendanceRepository, BookingRepository, LocationRepository};
use domain::attendance::{check_proximity, check_time_window, CheckInWindow};
use shared::types::{
    AttendanceStatus, BookingId, CheckInMethod, Coordinates, SessionId, SubjectId, TenantId,
};
use shared::{AppError, DomainError};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::metrics;
use crate::sessions;

#[derive(Debug, Clone)]
pub struct CheckInCommand {
    pub booking_id: BookingId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Defaults to now; carried explicitly so the protocol is testable.
    pub check_in_time: Option<DateTime<Utc>>,
}

/// Record a check-in for a confirmed booking.
///
/// The session is materialized to obtain its absolute start and location; a
/// cancelled date therefore rejects the check-in. GPS validation only runs
/// when the caller reported coordinates and the location has stored ones.
#[instrument(skip(pool, cmd), fields(tenant_id = %tenant_id, booking_id = %cmd.booking_id))]
pub async fn create_check_in(
    pool: &PgPool,
    window: &CheckInWindow,
    tenant_id: &TenantId,
    subject_id: Option<&SubjectId>,
    cmd: CheckInCommand,
) -> Result<AttendanceRecord, AppError> {
    let booking = BookingRepository::find_by_booking_id(pool, tenant_id, &cmd.booking_id)
        .await?
        .ok_or_else(|| DomainError::BookingNotFound(cmd.booking_id.to_string()))?;
    if booking.status != BookingStatus::Confirmed {
        return Err(AppError::Validation(format!(
            "booking {} is not confirmed",
            booking.id
        )));
    }
    if let Some(subject) = subject_id {
        if subject != &booking.subject_id {
            return Err(AppError::Forbidden);
        }
    }

    if let Some(existing) =
        AttendanceRepository::find(pool, tenant_id, &booking.session_id, &booking.id).await?
    {
        if existing.status == AttendanceStatus::Present {
            return Err(DomainError::AlreadyCheckedIn(booking.id.to_string()).into());
        }
    }

    let session = sessions::load_session(pool, tenant_id, &booking.session_id).await?;
    let check_in_time = cmd.check_in_time.unwrap_or_else(Utc::now);
    let status = check_time_window(check_in_time, session.start, window)?;

    let (method, distance_meters) = match (cmd.latitude, cmd.longitude) {
        (Some(latitude), Some(longitude)) => {
            let reported = Coordinates::new(latitude, longitude)
                .map_err(|err| DomainError::BadCoordinates(err.to_string()))?;
            let distance = match &session.location_id {
                Some(location_id) => {
                    let location =
                        LocationRepository::find_by_id(pool, tenant_id, location_id).await?;
                    match location.as_ref().and_then(|loc| loc.coordinates()) {
                        Some(expected) => {
                            let radius = location
                                .as_ref()
                                .map(|loc| loc.check_in_radius_meters)
                                .unwrap_or(db::models::DEFAULT_CHECK_IN_RADIUS_METERS);
                            Some(check_proximity(&reported, &expected, radius)?)
                        }
                        // No stored coordinates: position is recorded but
                        // not validated.
                        None => None,
                    }
                }
                None => None,
            };
            (CheckInMethod::Gps, distance)
        }
        (None, None) => (CheckInMethod::Manual, None),
        _ => {
            return Err(AppError::Validation(
                "latitude and longitude must be provided together".to_string(),
            ));
        }
    };

    let record = AttendanceRepository::upsert(
        pool,
        RecordAttendance {
            tenant_id: tenant_id.clone(),
            session_id: booking.session_id.clone(),
            booking_id: booking.id.clone(),
            subject_id: booking.subject_id.clone(),
            status,
            check_in_time: Some(check_in_time),
            check_in_method: method,
            check_in_latitude: cmd.latitude,
            check_in_longitude: cmd.longitude,
            distance_meters,
        },
    )
    .await?;

    metrics::record_check_in(tenant_id.as_str(), &status.to_string());
    info!(session_id = %record.session_id, status = %record.status, "check-in recorded");
    Ok(record)
}

/// Administrative attendance override: bypasses the window and GPS checks.
/// `check_in_time` is stamped now except for NO_SHOW.
#[instrument(skip(pool), fields(tenant_id = %tenant_id, session_id = %session_id, booking_id = %booking_id))]
pub async fn override_attendance(
    pool: &PgPool,
    tenant_id: &TenantId,
    session_id: &SessionId,
    booking_id: &BookingId,
    status: AttendanceStatus,
) -> Result<AttendanceRecord, AppError> {
    // Attendance always hangs off a real booking.
    let booking = BookingRepository::find(pool, tenant_id, session_id, booking_id)
        .await?
        .ok_or_else(|| DomainError::BookingNotFound(booking_id.to_string()))?;

    let check_in_time = match status {
        AttendanceStatus::NoShow => None,
        _ => Some(Utc::now()),
    };

    let record = AttendanceRepository::upsert(
        pool,
        RecordAttendance {
            tenant_id: tenant_id.clone(),
            session_id: session_id.clone(),
            booking_id: booking.id.clone(),
            subject_id: booking.subject_id.clone(),
            status,
            check_in_time,
            check_in_method: CheckInMethod::Override,
            check_in_latitude: None,
            check_in_longitude: None,
            distance_meters: None,
        },
    )
    .await?;

    info!(status = %record.status, "attendance overridden");
    Ok(record)
}

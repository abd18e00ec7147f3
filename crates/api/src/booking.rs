//! The booking engine: create and cancel protocols shared by the HTTP
//! routes and the event worker.
//!
//! Both mutations compose their writes into a single transaction so the
//! booking row and the capacity counter commit or fail together. A failed
//! reservation never leaves a booking row behind.

use db::models::{Booking, CreateBooking, ExceptionType};
use db::{BookingRepository, ScheduleExceptionRepository, ScheduleRepository, SessionSummaryRepository};
use shared::types::{BookingId, ScheduleType, SessionId, SubjectId, TenantId};
use shared::{AppError, DomainError};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::metrics;

/// Subject type recorded when the caller does not specify one.
pub const DEFAULT_SUBJECT_TYPE: &str = "MEMBER";

#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub session_id: SessionId,
    pub subject_id: SubjectId,
    pub subject_type: String,
    pub source: Option<String>,
    pub notes: Option<String>,
    /// Extension envelope carrying caller fields outside the schema
    /// (goal id, booking type, contact info, program pass-through).
    pub extra: Option<serde_json::Value>,
}

/// Create a confirmed booking against a virtual session.
///
/// Protocol: resolve the session from its id (schedule plus exception for
/// the date), reject duplicates for the subject, then atomically insert the
/// booking and reserve a seat in the capacity ledger.
#[instrument(skip(pool, cmd), fields(
    tenant_id = %tenant_id,
    session_id = %cmd.session_id,
    subject_id = %cmd.subject_id,
))]
pub async fn create_booking(
    pool: &PgPool,
    tenant_id: &TenantId,
    cmd: CreateBookingCommand,
) -> Result<Booking, AppError> {
    let session_id = cmd.session_id.clone();
    let schedule_id = session_id.schedule_id().clone();
    let date = session_id.date();

    // Resolve the session: the schedule must exist and the date must not be
    // cancelled. The session id names a virtual instance, so a missing
    // schedule surfaces as a missing session.
    let schedule = ScheduleRepository::find_by_id(pool, tenant_id, &schedule_id)
        .await?
        .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;
    let exception = ScheduleExceptionRepository::find(pool, tenant_id, &schedule_id, date).await?;
    if let Some(ex) = &exception {
        if ex.exception_type == ExceptionType::Cancelled {
            return Err(DomainError::SessionNotFound(session_id.to_string()).into());
        }
    }

    let resolved_capacity = match schedule.schedule_type {
        ScheduleType::Session => exception
            .as_ref()
            .and_then(|ex| ex.override_capacity)
            .or(schedule.base_capacity),
        ScheduleType::Block => None,
    };
    // A zero bound can never admit anyone; the ledger's insert path assumes
    // at least one seat, so reject it here.
    if matches!(resolved_capacity, Some(c) if c <= 0) {
        metrics::record_capacity_rejection(tenant_id.as_str());
        return Err(DomainError::AtCapacity(session_id.to_string()).into());
    }

    if let Some(existing) =
        BookingRepository::find_active_for_subject(pool, tenant_id, &session_id, &cmd.subject_id)
            .await?
    {
        return Err(DomainError::AlreadyBooked {
            booking_id: existing.id.to_string(),
        }
        .into());
    }

    let mut tx = pool.begin().await?;

    let booking = match BookingRepository::create_in_tx(
        &mut tx,
        CreateBooking {
            tenant_id: tenant_id.clone(),
            session_id: session_id.clone(),
            subject_id: cmd.subject_id.clone(),
            subject_type: cmd.subject_type,
            source: cmd.source,
            notes: cmd.notes,
            extra: cmd.extra,
        },
    )
    .await
    {
        Ok(booking) => booking,
        Err(err) if is_unique_violation(&err, "idx_bookings_subject_active") => {
            // A racing request for the same subject won the insert; report
            // the booking it created.
            tx.rollback().await.ok();
            let existing = BookingRepository::find_active_for_subject(
                pool,
                tenant_id,
                &session_id,
                &cmd.subject_id,
            )
            .await?;
            return match existing {
                Some(booking) => Err(DomainError::AlreadyBooked {
                    booking_id: booking.id.to_string(),
                }
                .into()),
                None => Err(AppError::Conflict("booking write conflict".to_string())),
            };
        }
        Err(err) => return Err(err.into()),
    };

    let reserved = SessionSummaryRepository::reserve_in_tx(
        &mut tx,
        tenant_id,
        &session_id,
        resolved_capacity,
        date,
    )
    .await?;
    if !reserved {
        tx.rollback().await.ok();
        metrics::record_capacity_rejection(tenant_id.as_str());
        return Err(DomainError::AtCapacity(session_id.to_string()).into());
    }

    tx.commit().await?;

    metrics::record_booking_created(
        tenant_id.as_str(),
        booking.source.as_deref().unwrap_or("api"),
    );
    info!(booking_id = %booking.id, "booking confirmed");
    Ok(booking)
}

/// Cancel a booking and release its seat.
///
/// `subject_id`, when known, must match the booking's subject. CONFIRMED to
/// CANCELLED is the only transition; there is no un-cancel.
#[instrument(skip(pool), fields(tenant_id = %tenant_id, booking_id = %booking_id))]
pub async fn cancel_booking(
    pool: &PgPool,
    tenant_id: &TenantId,
    booking_id: &BookingId,
    subject_id: Option<&SubjectId>,
) -> Result<Booking, AppError> {
    let booking = BookingRepository::find_by_booking_id(pool, tenant_id, booking_id)
        .await?
        .ok_or_else(|| DomainError::BookingNotFound(booking_id.to_string()))?;

    if let Some(subject) = subject_id {
        if subject != &booking.subject_id {
            return Err(AppError::Forbidden);
        }
    }
    if !booking.can_cancel() {
        return Err(DomainError::AlreadyCancelled(booking_id.to_string()).into());
    }

    let mut tx = pool.begin().await?;

    let cancelled = BookingRepository::cancel_in_tx(&mut tx, tenant_id, booking_id)
        .await?
        .ok_or_else(|| {
            // A racing cancel got there first; the counter was only
            // decremented once.
            DomainError::AlreadyCancelled(booking_id.to_string())
        })?;

    let released =
        SessionSummaryRepository::release_in_tx(&mut tx, tenant_id, &booking.session_id).await?;
    if !released {
        tx.rollback().await.ok();
        warn!(session_id = %booking.session_id, "release hit a zero counter");
        return Err(DomainError::CounterUnderflow(booking.session_id.to_string()).into());
    }

    tx.commit().await?;

    metrics::record_booking_cancelled(tenant_id.as_str());
    info!(session_id = %cancelled.session_id, "booking cancelled");
    Ok(cancelled)
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.constraint())
        .is_some_and(|name| name == constraint)
}

use shared::types::{BookingId, SessionId, SubjectId, TenantId};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::{Booking, BookingStatus, CreateBooking};

const BOOKING_COLUMNS: &str = "tenant_id, session_id, id, subject_id, subject_type, status, \
     source, notes, extra, created_at, cancelled_at";

pub struct BookingRepository;

impl BookingRepository {
    /// Insert a confirmed booking inside the engine's transaction. The
    /// partial unique index on (tenant, session, subject) backstops the
    /// duplicate check against racing writers.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: CreateBooking,
    ) -> Result<Booking, sqlx::Error> {
        let id = BookingId::generate();

        sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (tenant_id, session_id, id, subject_id, subject_type, status, source, notes, extra)
            VALUES ($1, $2, $3, $4, $5, 'confirmed', $6, $7, $8)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(&input.tenant_id)
        .bind(&input.session_id)
        .bind(&id)
        .bind(&input.subject_id)
        .bind(&input.subject_type)
        .bind(&input.source)
        .bind(&input.notes)
        .bind(input.extra.map(Json))
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_id: &SessionId,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE tenant_id = $1 AND session_id = $2 AND id = $3
            "#
        ))
        .bind(tenant_id)
        .bind(session_id)
        .bind(booking_id)
        .fetch_optional(pool)
        .await
    }

    /// Look up a booking by id alone, via the dedicated (tenant, id) index.
    pub async fn find_by_booking_id(
        pool: &PgPool,
        tenant_id: &TenantId,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE tenant_id = $1 AND id = $2
            "#
        ))
        .bind(tenant_id)
        .bind(booking_id)
        .fetch_optional(pool)
        .await
    }

    /// The booking that currently holds a seat for this subject on this
    /// session, if any. Cancelled bookings don't count.
    pub async fn find_active_for_subject(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_id: &SessionId,
        subject_id: &SubjectId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE tenant_id = $1 AND session_id = $2 AND subject_id = $3
              AND status <> 'cancelled'
            "#
        ))
        .bind(tenant_id)
        .bind(session_id)
        .bind(subject_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_session(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_id: &SessionId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE tenant_id = $1 AND session_id = $2
            ORDER BY created_at
            "#
        ))
        .bind(tenant_id)
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    /// Subject-scoped listing, newest first.
    pub async fn list_by_subject(
        pool: &PgPool,
        tenant_id: &TenantId,
        subject_id: &SubjectId,
        status: Option<BookingStatus>,
        limit: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Booking>(&format!(
                    r#"
                    SELECT {BOOKING_COLUMNS}
                    FROM bookings
                    WHERE tenant_id = $1 AND subject_id = $2 AND status = $3
                    ORDER BY created_at DESC
                    LIMIT $4
                    "#
                ))
                .bind(tenant_id)
                .bind(subject_id)
                .bind(status)
                .bind(limit)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Booking>(&format!(
                    r#"
                    SELECT {BOOKING_COLUMNS}
                    FROM bookings
                    WHERE tenant_id = $1 AND subject_id = $2
                    ORDER BY created_at DESC
                    LIMIT $3
                    "#
                ))
                .bind(tenant_id)
                .bind(subject_id)
                .bind(limit)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Flip a booking to cancelled inside the engine's transaction. Returns
    /// None when the booking was already cancelled by a racing writer.
    pub async fn cancel_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: &TenantId,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = 'cancelled', cancelled_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status <> 'cancelled'
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await
    }
}

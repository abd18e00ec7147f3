use shared::types::{BookingId, SessionId, SubjectId, TenantId};
use sqlx::PgPool;

use crate::models::{AttendanceRecord, RecordAttendance};

const ATTENDANCE_COLUMNS: &str = "tenant_id, session_id, booking_id, subject_id, status, \
     check_in_time, check_in_method, check_in_latitude, check_in_longitude, distance_meters, \
     created_at, updated_at";

pub struct AttendanceRepository;

impl AttendanceRepository {
    /// Write the attendance record for a booking. A booking has exactly one
    /// record, so a later write (re-check-in after LATE, or an admin
    /// override) replaces the earlier state.
    pub async fn upsert(
        pool: &PgPool,
        input: RecordAttendance,
    ) -> Result<AttendanceRecord, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            INSERT INTO attendance_records (tenant_id, session_id, booking_id, subject_id,
                status, check_in_time, check_in_method, check_in_latitude, check_in_longitude,
                distance_meters)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tenant_id, session_id, booking_id)
            DO UPDATE SET status = EXCLUDED.status,
                check_in_time = EXCLUDED.check_in_time,
                check_in_method = EXCLUDED.check_in_method,
                check_in_latitude = EXCLUDED.check_in_latitude,
                check_in_longitude = EXCLUDED.check_in_longitude,
                distance_meters = EXCLUDED.distance_meters,
                updated_at = NOW()
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(&input.tenant_id)
        .bind(&input.session_id)
        .bind(&input.booking_id)
        .bind(&input.subject_id)
        .bind(input.status)
        .bind(input.check_in_time)
        .bind(input.check_in_method)
        .bind(input.check_in_latitude)
        .bind(input.check_in_longitude)
        .bind(input.distance_meters)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_id: &SessionId,
        booking_id: &BookingId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance_records
            WHERE tenant_id = $1 AND session_id = $2 AND booking_id = $3
            "#
        ))
        .bind(tenant_id)
        .bind(session_id)
        .bind(booking_id)
        .fetch_optional(pool)
        .await
    }

    /// Roster for one session.
    pub async fn list_by_session(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_id: &SessionId,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance_records
            WHERE tenant_id = $1 AND session_id = $2
            ORDER BY created_at
            "#
        ))
        .bind(tenant_id)
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_subject(
        pool: &PgPool,
        tenant_id: &TenantId,
        subject_id: &SubjectId,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance_records
            WHERE tenant_id = $1 AND subject_id = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .bind(subject_id)
        .fetch_all(pool)
        .await
    }
}

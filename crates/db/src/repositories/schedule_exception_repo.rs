use chrono::NaiveDate;
use shared::types::{ScheduleId, TenantId};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{CreateScheduleException, ScheduleException, UpdateScheduleException};

const EXCEPTION_COLUMNS: &str = "tenant_id, schedule_id, occurrence_date, exception_type, \
     override_start, override_end, override_capacity, override_hosts, override_location_id, \
     extra, created_at, updated_at";

pub struct ScheduleExceptionRepository;

impl ScheduleExceptionRepository {
    /// Create or replace the exception for one occurrence date. A date holds
    /// at most one exception, so a second write supersedes the first.
    pub async fn upsert(
        pool: &PgPool,
        input: CreateScheduleException,
    ) -> Result<ScheduleException, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(&format!(
            r#"
            INSERT INTO schedule_exceptions (tenant_id, schedule_id, occurrence_date,
                exception_type, override_start, override_end, override_capacity,
                override_hosts, override_location_id, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tenant_id, schedule_id, occurrence_date)
            DO UPDATE SET exception_type = EXCLUDED.exception_type,
                override_start = EXCLUDED.override_start,
                override_end = EXCLUDED.override_end,
                override_capacity = EXCLUDED.override_capacity,
                override_hosts = EXCLUDED.override_hosts,
                override_location_id = EXCLUDED.override_location_id,
                extra = EXCLUDED.extra,
                updated_at = NOW()
            RETURNING {EXCEPTION_COLUMNS}
            "#
        ))
        .bind(&input.tenant_id)
        .bind(&input.schedule_id)
        .bind(input.occurrence_date)
        .bind(input.exception_type)
        .bind(input.override_start)
        .bind(input.override_end)
        .bind(input.override_capacity)
        .bind(input.override_hosts.map(Json))
        .bind(&input.override_location_id)
        .bind(input.extra.map(Json))
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: &TenantId,
        schedule_id: &ScheduleId,
        occurrence_date: NaiveDate,
    ) -> Result<Option<ScheduleException>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(&format!(
            r#"
            SELECT {EXCEPTION_COLUMNS}
            FROM schedule_exceptions
            WHERE tenant_id = $1 AND schedule_id = $2 AND occurrence_date = $3
            "#
        ))
        .bind(tenant_id)
        .bind(schedule_id)
        .bind(occurrence_date)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_schedule(
        pool: &PgPool,
        tenant_id: &TenantId,
        schedule_id: &ScheduleId,
    ) -> Result<Vec<ScheduleException>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(&format!(
            r#"
            SELECT {EXCEPTION_COLUMNS}
            FROM schedule_exceptions
            WHERE tenant_id = $1 AND schedule_id = $2
            ORDER BY occurrence_date
            "#
        ))
        .bind(tenant_id)
        .bind(schedule_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_in_range(
        pool: &PgPool,
        tenant_id: &TenantId,
        schedule_id: &ScheduleId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ScheduleException>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(&format!(
            r#"
            SELECT {EXCEPTION_COLUMNS}
            FROM schedule_exceptions
            WHERE tenant_id = $1 AND schedule_id = $2
              AND occurrence_date >= $3 AND occurrence_date <= $4
            ORDER BY occurrence_date
            "#
        ))
        .bind(tenant_id)
        .bind(schedule_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: &TenantId,
        schedule_id: &ScheduleId,
        occurrence_date: NaiveDate,
        input: UpdateScheduleException,
    ) -> Result<Option<ScheduleException>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(&format!(
            r#"
            UPDATE schedule_exceptions
            SET exception_type = COALESCE($4, exception_type),
                override_start = COALESCE($5, override_start),
                override_end = COALESCE($6, override_end),
                override_capacity = COALESCE($7, override_capacity),
                override_hosts = COALESCE($8, override_hosts),
                override_location_id = COALESCE($9, override_location_id),
                extra = COALESCE($10, extra),
                updated_at = NOW()
            WHERE tenant_id = $1 AND schedule_id = $2 AND occurrence_date = $3
            RETURNING {EXCEPTION_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(schedule_id)
        .bind(occurrence_date)
        .bind(input.exception_type)
        .bind(input.override_start)
        .bind(input.override_end)
        .bind(input.override_capacity)
        .bind(input.override_hosts.map(Json))
        .bind(&input.override_location_id)
        .bind(input.extra.map(Json))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &PgPool,
        tenant_id: &TenantId,
        schedule_id: &ScheduleId,
        occurrence_date: NaiveDate,
    ) -> Result<Option<ScheduleException>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(&format!(
            r#"
            DELETE FROM schedule_exceptions
            WHERE tenant_id = $1 AND schedule_id = $2 AND occurrence_date = $3
            RETURNING {EXCEPTION_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(schedule_id)
        .bind(occurrence_date)
        .fetch_optional(pool)
        .await
    }
}

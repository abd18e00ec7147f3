use shared::types::{HostId, ProgramId, ScheduleId, TenantId};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{CreateSchedule, Schedule, UpdateSchedule};

const SCHEDULE_COLUMNS: &str = "tenant_id, id, schedule_type, program_id, name, start_time, \
     end_time, timezone, is_recurring, rrule, base_capacity, hosts, primary_host_id, \
     location_id, tags, extra, created_at, updated_at";

pub struct ScheduleRepository;

impl ScheduleRepository {
    pub async fn create(pool: &PgPool, input: CreateSchedule) -> Result<Schedule, sqlx::Error> {
        let id = ScheduleId::generate();
        let primary_host_id = input.hosts.first().map(|h| h.id.to_string());

        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            INSERT INTO schedules (tenant_id, id, schedule_type, program_id, name, start_time,
                end_time, timezone, is_recurring, rrule, base_capacity, hosts, primary_host_id,
                location_id, tags, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(&input.tenant_id)
        .bind(&id)
        .bind(input.schedule_type)
        .bind(&input.program_id)
        .bind(&input.name)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.timezone)
        .bind(input.is_recurring)
        .bind(&input.rrule)
        .bind(input.base_capacity)
        .bind(Json(&input.hosts))
        .bind(&primary_host_id)
        .bind(&input.location_id)
        .bind(&input.tags)
        .bind(input.extra.map(Json))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &ScheduleId,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE tenant_id = $1 AND id = $2
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<Schedule>, sqlx::Error> {
        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// List schedules attached to any of the given programs.
    pub async fn list_by_programs(
        pool: &PgPool,
        tenant_id: &TenantId,
        program_ids: &[ProgramId],
    ) -> Result<Vec<Schedule>, sqlx::Error> {
        let ids: Vec<String> = program_ids.iter().map(|p| p.to_string()).collect();
        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE tenant_id = $1 AND program_id = ANY($2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .bind(&ids)
        .fetch_all(pool)
        .await
    }

    /// List schedules whose primary host matches.
    pub async fn list_by_primary_host(
        pool: &PgPool,
        tenant_id: &TenantId,
        host_id: &HostId,
    ) -> Result<Vec<Schedule>, sqlx::Error> {
        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE tenant_id = $1 AND primary_host_id = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .bind(host_id.as_str())
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &ScheduleId,
        input: UpdateSchedule,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        // The denormalized primary host follows the host list whenever the
        // list changes.
        let primary_host_id = input
            .hosts
            .as_ref()
            .map(|hosts| hosts.first().map(|h| h.id.to_string()));

        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            UPDATE schedules
            SET program_id = COALESCE($3, program_id),
                name = COALESCE($4, name),
                start_time = COALESCE($5, start_time),
                end_time = COALESCE($6, end_time),
                timezone = COALESCE($7, timezone),
                is_recurring = COALESCE($8, is_recurring),
                rrule = COALESCE($9, rrule),
                base_capacity = COALESCE($10, base_capacity),
                hosts = COALESCE($11, hosts),
                primary_host_id = CASE WHEN $11::jsonb IS NULL THEN primary_host_id ELSE $12 END,
                location_id = COALESCE($13, location_id),
                tags = COALESCE($14, tags),
                extra = COALESCE($15, extra),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(&input.program_id)
        .bind(&input.name)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.timezone)
        .bind(input.is_recurring)
        .bind(&input.rrule)
        .bind(input.base_capacity)
        .bind(input.hosts.as_ref().map(Json))
        .bind(primary_host_id.flatten())
        .bind(&input.location_id)
        .bind(&input.tags)
        .bind(input.extra.map(Json))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &ScheduleId,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            DELETE FROM schedules
            WHERE tenant_id = $1 AND id = $2
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

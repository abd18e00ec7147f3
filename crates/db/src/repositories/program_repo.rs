use shared::types::{ProgramId, TenantId};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{CreateProgram, Program, UpdateProgram};

pub struct ProgramRepository;

impl ProgramRepository {
    pub async fn create(pool: &PgPool, input: CreateProgram) -> Result<Program, sqlx::Error> {
        let id = ProgramId::generate();

        sqlx::query_as::<_, Program>(
            r#"
            INSERT INTO programs (tenant_id, id, name, description, tags, extra)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING tenant_id, id, name, description, tags, extra, created_at, updated_at
            "#,
        )
        .bind(&input.tenant_id)
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.tags)
        .bind(input.extra.map(Json))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &ProgramId,
    ) -> Result<Option<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(
            r#"
            SELECT tenant_id, id, name, description, tags, extra, created_at, updated_at
            FROM programs
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(
            r#"
            SELECT tenant_id, id, name, description, tags, extra, created_at, updated_at
            FROM programs
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &ProgramId,
        input: UpdateProgram,
    ) -> Result<Option<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(
            r#"
            UPDATE programs
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                tags = COALESCE($5, tags),
                extra = COALESCE($6, extra),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING tenant_id, id, name, description, tags, extra, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.tags)
        .bind(input.extra.map(Json))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &ProgramId,
    ) -> Result<Option<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(
            r#"
            DELETE FROM programs
            WHERE tenant_id = $1 AND id = $2
            RETURNING tenant_id, id, name, description, tags, extra, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

use shared::types::{LocationId, TenantId};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{CreateLocation, Location, UpdateLocation};

pub struct LocationRepository;

impl LocationRepository {
    pub async fn create(pool: &PgPool, input: CreateLocation) -> Result<Location, sqlx::Error> {
        let id = LocationId::generate();

        sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (tenant_id, id, name, address, latitude, longitude, check_in_radius_meters, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING tenant_id, id, name, address, latitude, longitude, check_in_radius_meters, extra, created_at, updated_at
            "#,
        )
        .bind(&input.tenant_id)
        .bind(&id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.check_in_radius_meters)
        .bind(input.extra.map(Json))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &LocationId,
    ) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT tenant_id, id, name, address, latitude, longitude, check_in_radius_meters, extra, created_at, updated_at
            FROM locations
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT tenant_id, id, name, address, latitude, longitude, check_in_radius_meters, extra, created_at, updated_at
            FROM locations
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
        id: &LocationId,
        input: UpdateLocation,
    ) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations
            SET name = COALESCE($3, name),
                address = COALESCE($4, address),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                check_in_radius_meters = COALESCE($7, check_in_radius_meters),
                extra = COALESCE($8, extra),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING tenant_id, id, name, address, latitude, longitude, check_in_radius_meters, extra, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.check_in_radius_meters)
        .bind(input.extra.map(Json))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &PgPool,
        tenant_id: &TenantId,
        id: &LocationId,
    ) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            DELETE FROM locations
            WHERE tenant_id = $1 AND id = $2
            RETURNING tenant_id, id, name, address, latitude, longitude, check_in_radius_meters, extra, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

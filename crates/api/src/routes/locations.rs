use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use db::models::{CreateLocation, Location, UpdateLocation, DEFAULT_CHECK_IN_RADIUS_METERS};
use db::LocationRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::LocationId;
use shared::{AppError, DomainError};
use validator::Validate;

use crate::{
    auth::TenantContext,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsQuery {
    pub location_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 1.0))]
    pub check_in_radius_meters: Option<f64>,
    pub extra: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub location_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 1.0))]
    pub check_in_radius_meters: Option<f64>,
    pub extra: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub location_id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub check_in_radius_meters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            location_id: location.id.to_string(),
            name: location.name,
            address: location.address,
            latitude: location.latitude,
            longitude: location.longitude,
            check_in_radius_meters: location.check_in_radius_meters,
            extra: location.extra.map(|json| json.0),
            created_at: location.created_at.to_rfc3339(),
            updated_at: location.updated_at.to_rfc3339(),
        }
    }
}

fn require_paired_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ApiError> {
    if latitude.is_some() != longitude.is_some() {
        return Err(ApiError::from(AppError::Validation(
            "latitude and longitude must be provided together".to_string(),
        )));
    }
    Ok(())
}

/// GET /scheduling/locations - one location or the tenant's list
pub async fn get_locations(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<LocationsQuery>,
) -> ApiResult<Json<Value>> {
    match query.location_id {
        Some(id) => {
            let location_id = LocationId::from(id.as_str());
            let location =
                LocationRepository::find_by_id(&state.pool, &tenant.tenant_id, &location_id)
                    .await?
                    .ok_or_else(|| ApiError::from(DomainError::LocationNotFound(id)))?;
            Ok(Json(serde_json::json!(LocationResponse::from(location))))
        }
        None => {
            let locations = LocationRepository::list(&state.pool, &tenant.tenant_id).await?;
            let responses: Vec<LocationResponse> =
                locations.into_iter().map(LocationResponse::from).collect();
            Ok(Json(serde_json::json!(responses)))
        }
    }
}

/// POST /scheduling/locations
pub async fn create_location(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateLocationRequest>,
) -> ApiResult<(StatusCode, Json<LocationResponse>)> {
    req.validate()
        .map_err(|err| ApiError::from(AppError::Validation(err.to_string())))?;
    require_paired_coordinates(req.latitude, req.longitude)?;

    let location = LocationRepository::create(
        &state.pool,
        CreateLocation {
            tenant_id: tenant.tenant_id,
            name: req.name,
            address: req.address,
            latitude: req.latitude,
            longitude: req.longitude,
            check_in_radius_meters: req
                .check_in_radius_meters
                .unwrap_or(DEFAULT_CHECK_IN_RADIUS_METERS),
            extra: req.extra,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(LocationResponse::from(location))))
}

/// PATCH /scheduling/locations - id travels in the body
pub async fn update_location(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<UpdateLocationRequest>,
) -> ApiResult<Json<LocationResponse>> {
    req.validate()
        .map_err(|err| ApiError::from(AppError::Validation(err.to_string())))?;

    let location_id = LocationId::from(req.location_id.as_str());
    let location = LocationRepository::update(
        &state.pool,
        &tenant.tenant_id,
        &location_id,
        UpdateLocation {
            name: req.name,
            address: req.address,
            latitude: req.latitude,
            longitude: req.longitude,
            check_in_radius_meters: req.check_in_radius_meters,
            extra: req.extra,
        },
    )
    .await?
    .ok_or_else(|| ApiError::from(DomainError::LocationNotFound(req.location_id)))?;

    Ok(Json(LocationResponse::from(location)))
}

/// DELETE /scheduling/locations?locationId=
pub async fn delete_location(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<LocationsQuery>,
) -> ApiResult<Json<LocationResponse>> {
    let id = query.location_id.ok_or_else(|| {
        ApiError::from(AppError::Validation("locationId is required".to_string()))
    })?;
    let location_id = LocationId::from(id.as_str());
    let location = LocationRepository::delete(&state.pool, &tenant.tenant_id, &location_id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::LocationNotFound(id)))?;

    Ok(Json(LocationResponse::from(location)))
}

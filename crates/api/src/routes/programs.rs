use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use db::models::{CreateProgram, Program, UpdateProgram};
use db::ProgramRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::ProgramId;
use shared::{AppError, DomainError};
use validator::Validate;

use crate::{
    auth::TenantContext,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramsQuery {
    pub program_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub extra: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramRequest {
    pub program_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub extra: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramResponse {
    pub program_id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Program> for ProgramResponse {
    fn from(program: Program) -> Self {
        Self {
            program_id: program.id.to_string(),
            name: program.name,
            description: program.description,
            tags: program.tags,
            extra: program.extra.map(|json| json.0),
            created_at: program.created_at.to_rfc3339(),
            updated_at: program.updated_at.to_rfc3339(),
        }
    }
}

/// GET /scheduling/programs - one program or the tenant's list
pub async fn get_programs(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ProgramsQuery>,
) -> ApiResult<Json<Value>> {
    match query.program_id {
        Some(id) => {
            let program_id = ProgramId::from(id.as_str());
            let program = ProgramRepository::find_by_id(&state.pool, &tenant.tenant_id, &program_id)
                .await?
                .ok_or_else(|| ApiError::from(DomainError::ProgramNotFound(id)))?;
            Ok(Json(serde_json::json!(ProgramResponse::from(program))))
        }
        None => {
            let programs = ProgramRepository::list(&state.pool, &tenant.tenant_id).await?;
            let responses: Vec<ProgramResponse> =
                programs.into_iter().map(ProgramResponse::from).collect();
            Ok(Json(serde_json::json!(responses)))
        }
    }
}

/// POST /scheduling/programs
pub async fn create_program(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateProgramRequest>,
) -> ApiResult<(StatusCode, Json<ProgramResponse>)> {
    req.validate()
        .map_err(|err| ApiError::from(AppError::Validation(err.to_string())))?;

    let program = ProgramRepository::create(
        &state.pool,
        CreateProgram {
            tenant_id: tenant.tenant_id,
            name: req.name,
            description: req.description,
            tags: req.tags,
            extra: req.extra,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ProgramResponse::from(program))))
}

/// PATCH /scheduling/programs - id travels in the body
pub async fn update_program(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<UpdateProgramRequest>,
) -> ApiResult<Json<ProgramResponse>> {
    req.validate()
        .map_err(|err| ApiError::from(AppError::Validation(err.to_string())))?;

    let program_id = ProgramId::from(req.program_id.as_str());
    let program = ProgramRepository::update(
        &state.pool,
        &tenant.tenant_id,
        &program_id,
        UpdateProgram {
            name: req.name,
            description: req.description,
            tags: req.tags,
            extra: req.extra,
        },
    )
    .await?
    .ok_or_else(|| ApiError::from(DomainError::ProgramNotFound(req.program_id)))?;

    Ok(Json(ProgramResponse::from(program)))
}

/// DELETE /scheduling/programs?programId=
pub async fn delete_program(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ProgramsQuery>,
) -> ApiResult<Json<ProgramResponse>> {
    let id = query.program_id.ok_or_else(|| {
        ApiError::from(AppError::Validation("programId is required".to_string()))
    })?;
    let program_id = ProgramId::from(id.as_str());
    let program = ProgramRepository::delete(&state.pool, &tenant.tenant_id, &program_id)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::ProgramNotFound(id)))?;

    Ok(Json(ProgramResponse::from(program)))
}

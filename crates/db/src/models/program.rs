use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{ProgramId, TenantId};
use sqlx::types::Json;
use sqlx::FromRow;

/// Program database model: metadata for what a schedule offers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Program {
    pub tenant_id: TenantId,
    pub id: ProgramId,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Extension envelope for caller-supplied fields outside the schema.
    pub extra: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new program
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgram {
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub extra: Option<serde_json::Value>,
}

/// Input for updating a program; absent fields are unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProgram {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub extra: Option<serde_json::Value>,
}

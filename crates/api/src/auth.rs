use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::types::{SubjectId, TenantId};
use shared::AppError;
use std::future::Future;

use crate::{error::ApiError, state::AppState};

/// Claims read off a bearer token. Authentication itself happens upstream;
/// this service only consumes the tenant and subject claims.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, rename = "custom:tenantId")]
    pub tenant_id: Option<String>,
    #[serde(default, rename = "custom:tenant_id")]
    pub tenant_id_snake: Option<String>,
    #[serde(default)]
    pub exp: Option<usize>,
}

impl Claims {
    /// Tenant claim, preferring `custom:tenantId` over `custom:tenant_id`.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant_id
            .as_deref()
            .or(self.tenant_id_snake.as_deref())
    }
}

/// Verify and decode a bearer token's claims, when a secret is configured.
fn bearer_claims(parts: &Parts, secret: Option<&str>) -> Option<Claims> {
    let secret = secret?;
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Pull a single query parameter out of a raw query string.
pub(crate) fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then(|| v.to_string())
    })
}

/// Extractor for the tenant scope of a request.
///
/// Resolution order: authenticated claim (`custom:tenantId` or
/// `custom:tenant_id`), then the `X-Tenant-Id` header, then the `tenantId`
/// query parameter. Requests carrying none of these are rejected.
pub struct TenantContext {
    pub tenant_id: TenantId,
}

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 AppState,
    ) -> std::pin::Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let result = (|| {
            if let Some(claims) = bearer_claims(parts, state.jwt_secret.as_deref()) {
                if let Some(tenant) = claims.tenant() {
                    return Ok(TenantContext {
                        tenant_id: TenantId::from(tenant),
                    });
                }
            }
            if let Some(tenant) = header_value(parts, "x-tenant-id") {
                return Ok(TenantContext {
                    tenant_id: TenantId::from(tenant),
                });
            }
            if let Some(tenant) = query_param(parts.uri.query(), "tenantId") {
                return Ok(TenantContext {
                    tenant_id: TenantId::from(tenant),
                });
            }
            Err(ApiError::from(AppError::Unauthorized))
        })();

        Box::pin(std::future::ready(result))
    }
}

/// Extractor for the caller's subject identity, when one is present.
///
/// Resolution order: claim `sub`, then the `X-Subject-Id` header. Routes
/// that accept a body-level `subjectId` apply that fallback themselves.
pub struct SubjectContext {
    pub subject_id: Option<SubjectId>,
}

impl FromRequestParts<AppState> for SubjectContext {
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 AppState,
    ) -> std::pin::Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let subject_id = bearer_claims(parts, state.jwt_secret.as_deref())
            .and_then(|claims| claims.sub)
            .or_else(|| header_value(parts, "x-subject-id"))
            .map(SubjectId::from);

        Box::pin(std::future::ready(Ok(SubjectContext { subject_id })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_extraction() {
        let query = Some("tenantId=tnt_1&programId=prog_2");
        assert_eq!(query_param(query, "tenantId").as_deref(), Some("tnt_1"));
        assert_eq!(query_param(query, "programId").as_deref(), Some("prog_2"));
        assert_eq!(query_param(query, "missing"), None);
        assert_eq!(query_param(None, "tenantId"), None);
        assert_eq!(query_param(Some("tenantId="), "tenantId"), None);
    }

    #[test]
    fn test_claims_prefer_camel_case_tenant() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub":"member_1","custom:tenantId":"tnt_a","custom:tenant_id":"tnt_b","exp":2000000000}"#,
        )
        .unwrap();
        assert_eq!(claims.tenant(), Some("tnt_a"));
        assert_eq!(claims.sub.as_deref(), Some("member_1"));
    }

    #[test]
    fn test_claims_fall_back_to_snake_case_tenant() {
        let claims: Claims =
            serde_json::from_str(r#"{"custom:tenant_id":"tnt_b"}"#).unwrap();
        assert_eq!(claims.tenant(), Some("tnt_b"));
        assert!(claims.sub.is_none());
    }
}

use crate::app::ScopedRepository;
use crate::auth::AccessToken;
use crate::domain::Role;
use crate::error::AppError;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<AccessToken> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(AccessToken::from_authorization)
}

/// Looks up the repository for `{role}/{resource}`. Unknown pairs are 404.
pub fn resolve_resource(state: &AppState, role: &str, resource: &str) -> Result<ScopedRepository<JsonValue>, AppError> {
    let unknown = || AppError::not_found(format!("unknown resource '{}/{}'", role, resource));
    let role: Role = role.parse().map_err(|_| unknown())?;
    state
        .marketplace
        .resource(role, resource.trim())
        .ok_or_else(unknown)
}

pub fn ok_json<T: Serialize>(data: &T) -> Result<Json<ApiResponse>, AppError> {
    Ok(Json(ApiResponse::ok(serde_json::to_value(data)?)))
}

//! Generic CRUD over `/api/{role}/{resource}`.
//!
//! Every handler resolves the role-scoped repository for the path and lets it
//! enforce authorization and ownership.

use crate::error::AppError;
use crate::transport::http::handlers::common::{bearer_token, ok_json, resolve_resource};
use crate::transport::http::types::{json_422, ApiResponse, AppState, RecordPath, ResourcePath};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value as JsonValue;

#[utoipa::path(
    get,
    path = "/api/{role}/{resource}",
    params(
        ("role" = String, Path, description = "customer, driver, seller or freelancer"),
        ("resource" = String, Path, description = "Resource of the role (e.g. orders, food-items)")
    ),
    responses(
        (status = 200, description = "Rows owned by the caller, newest first", body = ApiResponse),
        (status = 401, description = "No session or wrong role", body = ApiResponse),
        (status = 404, description = "Unknown resource", body = ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Path(path): Path<ResourcePath>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse>, AppError> {
    let repo = resolve_resource(&state, &path.role, &path.resource)?;
    let rows = repo.list(bearer_token(&headers).as_ref()).await?;
    ok_json(&rows)
}

#[utoipa::path(
    post,
    path = "/api/{role}/{resource}",
    params(
        ("role" = String, Path, description = "customer, driver, seller or freelancer"),
        ("resource" = String, Path, description = "Resource of the role")
    ),
    request_body(content = Object, description = "Row fields; the ownership field is set by the server"),
    responses(
        (status = 201, description = "Row created", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "No session or wrong role", body = ApiResponse),
        (status = 403, description = "Create not permitted on this resource", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_handler(
    State(state): State<AppState>,
    Path(path): Path<ResourcePath>,
    headers: HeaderMap,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response, AppError> {
    let repo = resolve_resource(&state, &path.role, &path.resource)?;
    let Json(fields) = match body {
        Ok(v) => v,
        Err(e) => return Ok(json_422(e, "{\"field\": value, ...}").into_response()),
    };

    let row = repo.create(bearer_token(&headers).as_ref(), &fields).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(row))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/{role}/{resource}/{id}",
    params(
        ("role" = String, Path, description = "customer, driver, seller or freelancer"),
        ("resource" = String, Path, description = "Resource of the role"),
        ("id" = String, Path, description = "Row id (uuid)")
    ),
    responses(
        (status = 200, description = "The row", body = ApiResponse),
        (status = 401, description = "No session or wrong role", body = ApiResponse),
        (status = 404, description = "Missing or owned by someone else", body = ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(path): Path<RecordPath>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse>, AppError> {
    let repo = resolve_resource(&state, &path.role, &path.resource)?;
    let row = repo.get(bearer_token(&headers).as_ref(), &path.id).await?;
    ok_json(&row)
}

#[utoipa::path(
    patch,
    path = "/api/{role}/{resource}/{id}",
    params(
        ("role" = String, Path, description = "customer, driver, seller or freelancer"),
        ("resource" = String, Path, description = "Resource of the role"),
        ("id" = String, Path, description = "Row id (uuid)")
    ),
    request_body(content = Object, description = "Fields to change"),
    responses(
        (status = 200, description = "Updated row", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "No session or wrong role", body = ApiResponse),
        (status = 403, description = "Field not updatable on this resource", body = ApiResponse),
        (status = 404, description = "Missing or owned by someone else", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_handler(
    State(state): State<AppState>,
    Path(path): Path<RecordPath>,
    headers: HeaderMap,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response, AppError> {
    let repo = resolve_resource(&state, &path.role, &path.resource)?;
    let Json(patch) = match body {
        Ok(v) => v,
        Err(e) => return Ok(json_422(e, "{\"field\": value, ...}").into_response()),
    };

    let row = repo
        .update(bearer_token(&headers).as_ref(), &path.id, &patch)
        .await?;
    Ok(Json(ApiResponse::ok(row)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/{role}/{resource}/{id}",
    params(
        ("role" = String, Path, description = "customer, driver, seller or freelancer"),
        ("resource" = String, Path, description = "Resource of the role"),
        ("id" = String, Path, description = "Row id (uuid)")
    ),
    responses(
        (status = 200, description = "Deleted (also when nothing matched)", body = ApiResponse),
        (status = 401, description = "No session or wrong role", body = ApiResponse),
        (status = 403, description = "Delete not permitted on this resource", body = ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(path): Path<RecordPath>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse>, AppError> {
    let repo = resolve_resource(&state, &path.role, &path.resource)?;
    repo.delete(bearer_token(&headers).as_ref(), &path.id).await?;
    ok_json(&serde_json::json!({ "deleted": path.id }))
}

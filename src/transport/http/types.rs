use crate::app::Marketplace;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub marketplace: Arc<Marketplace>,
}

impl AppState {
    pub fn new(marketplace: Arc<Marketplace>) -> Self {
        Self { marketplace }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Path of a role-scoped resource, e.g. `seller/products`.
#[derive(Deserialize, Debug)]
pub struct ResourcePath {
    pub role: String,
    pub resource: String,
}

#[derive(Deserialize, Debug)]
pub struct RecordPath {
    pub role: String,
    pub resource: String,
    pub id: String,
}

/// Identity of the caller as returned by `/api/me`.
#[derive(Serialize, Debug, ToSchema)]
pub struct IdentityResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
    /// `directory` when read from the users table, `claim` when taken from the session.
    pub role_source: String,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid JSON body: {} (expected: {})", err, expected)),
        }),
    )
}

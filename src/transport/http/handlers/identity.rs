use crate::auth::RoleSource;
use crate::error::AppError;
use crate::transport::http::handlers::common::{bearer_token, ok_json};
use crate::transport::http::types::{ApiResponse, AppState, IdentityResponse};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Caller identity and resolved role", body = ApiResponse),
        (status = 401, description = "No active session or no role on record", body = ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn current_identity_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse>, AppError> {
    let token = bearer_token(&headers);
    let identity = state.marketplace.gate().current_identity(token.as_ref()).await?;

    ok_json(&IdentityResponse {
        user_id: identity.user_id.to_string(),
        email: identity.email,
        role: identity.role.to_string(),
        role_source: match identity.role_source {
            RoleSource::Directory => "directory",
            RoleSource::Claim => "claim",
        }
        .to_string(),
    })
}

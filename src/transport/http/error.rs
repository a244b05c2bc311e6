//! Renders [`AppError`] as the `{success, data, error}` envelope.

use super::types::ApiResponse;
use crate::error::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Config(_) | AppError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::NotPermitted(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Validation(_) | AppError::InvalidFields { .. } => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(application_error = ?self, "Responding with error");
        } else {
            tracing::debug!(application_error = %self, "Responding with error");
        }

        let (message, data) = match &self {
            // Backend details stay in the logs.
            AppError::Backend(_) => ("Database operation failed".to_string(), None),
            AppError::Config(_) => ("Configuration issue".to_string(), None),
            AppError::InvalidFields { message, errors } => (
                message.clone(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            other => (other.to_string(), None),
        };

        (
            status,
            Json(ApiResponse {
                success: false,
                data,
                error: Some(message),
            }),
        )
            .into_response()
    }
}

//! Error taxonomy shared by the gate and the repositories.
//!
//! HTTP rendering lives in `transport::http::error`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not Permitted: {0}")]
    NotPermitted(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    /// Field-level validation failures, one entry per offending field.
    #[error("Validation Error: {message}")]
    InvalidFields {
        message: String,
        errors: Vec<crate::domain::model::FieldError>,
    },

    #[error("Backend Error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Backend(anyhow::Error::new(err).context("failed to decode record"))
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

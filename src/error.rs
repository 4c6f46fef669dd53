use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use std::sync::Arc;

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Failed to parse JSON: {0}")]
    Parse(String),

    #[error("Invalid data format received: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A failure handed to every caller waiting on the same fetch.
    #[error(transparent)]
    Shared(#[from] Arc<AppError>),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Transport(_) | AppError::Status(_) => StatusCode::BAD_GATEWAY,
            AppError::Parse(_) | AppError::Shape(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Shared(inner) => inner.status_code(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        response::error(&self)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Status(status.as_u16()),
            None if err.is_decode() => AppError::Parse(err.to_string()),
            None => AppError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

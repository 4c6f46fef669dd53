use serde::Serialize;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::error::AppError;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

#[derive(Serialize)]
pub struct ResponseMeta {
    pub status: String,
    pub status_code: u16,
    pub timestamp: String,
    pub message: Option<String>,
}

fn envelope<T: Serialize>(status: StatusCode, data: Option<T>, message: Option<String>) -> Response {
    let meta = ResponseMeta {
        status: (if status.is_success() { "success" } else { "error" }).to_string(),
        status_code: status.as_u16(),
        timestamp: Utc::now().to_rfc3339(),
        message,
    };

    (status, Json(ApiResponse { data, meta })).into_response()
}

pub fn success<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, Some(data), None)
}

/// A successful response that carries no data, only a note.
pub fn done(message: impl Into<String>) -> Response {
    envelope::<()>(StatusCode::OK, None, Some(message.into()))
}

pub fn error(err: &AppError) -> Response {
    envelope::<()>(err.status_code(), None, Some(err.to_string()))
}

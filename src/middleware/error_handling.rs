use crate::error::AppError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// JSON error body returned for every failed request. Clients use
/// `error_type` to decide between retrying and prompting correction.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: &'static str,
}

/// Map domain errors to HTTP responses
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let error_type = match err {
        AppError::Validation(_) => "validation_error",
        AppError::Unauthorized => "authentication_error",
        AppError::Forbidden => "authorization_error",
        AppError::NotFound => "not_found_error",
        AppError::Database(_) | AppError::StorageUnavailable(_) => "storage_error",
        _ => "server_error",
    };

    let response = ErrorResponse {
        error: match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::SERVICE_UNAVAILABLE => "Service Unavailable",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
        .to_string(),
        message: err.to_string(),
        status: status.as_u16(),
        error_type,
    };

    (status, response)
}

pub fn into_response(err: AppError) -> impl IntoResponse {
    let (status, response) = map_error(&err);
    (status, Json(response))
}

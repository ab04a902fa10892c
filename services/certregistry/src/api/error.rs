//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every registry endpoint
//! returns the same `{code, message, request_id}` shape.
//!
//! # Key invariants and assumptions
//! - Status codes follow the registry taxonomy: validation 400, auth 401,
//!   not found 404, conflict 409, everything else 500.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
use crate::api::types::ErrorResponse;
use crate::error::RegistryError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::fmt::Debug;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use certregistry::api::error::api_not_found;
///
/// let err = api_not_found("Certificate not found");
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, code, message)
}

/// Build a 500 error, logging `err` server-side only.
pub fn api_internal<E: Debug>(message: &str, err: &E) -> ApiError {
    tracing::error!(error = ?err, "certregistry internal error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Map a domain error onto its HTTP category.
///
/// `context` becomes the client-facing message for storage failures.
pub fn registry_error(context: &str, err: RegistryError) -> ApiError {
    match err {
        RegistryError::Validation(message) => api_validation_error(&message),
        RegistryError::NotFound(_) => api_not_found("Certificate not found"),
        RegistryError::Conflict(message) => api_conflict("conflict", &message),
        RegistryError::Store(err) => api_internal(context, &err),
    }
}

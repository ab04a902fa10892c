//! Bearer-token guard for admin routes.
//!
//! Handlers call [`require_admin`] first; a missing, malformed, foreign or
//! expired token yields a 401 before any store access.
use super::AuthError;
use super::token::SessionClaims;
use crate::api::error::{ApiError, api_unauthorized};
use crate::app::AppState;
use axum::http::HeaderMap;

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::MissingToken)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<SessionClaims, ApiError> {
    let bearer = extract_bearer(headers).map_err(|_| api_unauthorized("Unauthorized"))?;
    state.signer.verify(bearer).map_err(|err| {
        tracing::debug!(error = %err, "rejected admin session token");
        api_unauthorized("Unauthorized")
    })
}

//! Admin login and session endpoints.
use super::password::verify_password;
use super::session::require_admin;
use super::token::SessionClaims;
use crate::api::error::{ApiError, api_internal, api_unauthorized, api_validation_error};
use crate::api::types::{LoginRequest, LoginResponse, SessionAdmin, SessionResponse};
use crate::app::AppState;
use crate::store::StoreError;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const SESSION_NO_LONGER_VALID: &str = "Session is no longer valid";

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::types::ErrorResponse)
    )
)]
/// Exchange admin credentials for a bearer session token.
///
/// Unknown emails and wrong passwords produce the same 401 so the endpoint
/// does not reveal which accounts exist.
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(api_validation_error("Email and password are required"));
    }
    let admin = state
        .store
        .find_admin_by_email(email)
        .await
        .map_err(|err| api_internal("Failed to sign in", &err))?
        .ok_or_else(|| api_unauthorized(INVALID_CREDENTIALS))?;
    let matches = verify_password(&body.password, &admin.password_hash)
        .map_err(|err| api_internal("Failed to sign in", &err))?;
    if !matches {
        tracing::info!(admin_id = %admin.id, "admin login rejected");
        return Err(api_unauthorized(INVALID_CREDENTIALS));
    }
    let issued = state
        .signer
        .mint(&admin)
        .map_err(|err| api_internal("Failed to sign in", &err))?;
    tracing::info!(admin_id = %admin.id, "admin signed in");
    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        admin: session_admin(&issued.claims),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Current admin session", body = SessionResponse),
        (status = 401, description = "No valid session", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Current admin, re-read from the store so a removed account stops
/// resolving even while its token is unexpired.
pub(crate) async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let claims = require_admin(&state, &headers)?;
    let admin_id =
        Uuid::parse_str(&claims.sub).map_err(|_| api_unauthorized(SESSION_NO_LONGER_VALID))?;
    let admin = match state.store.get_admin(admin_id).await {
        Ok(admin) => admin,
        Err(StoreError::NotFound(_)) => {
            tracing::info!(admin_id = %admin_id, "session for unknown admin rejected");
            return Err(api_unauthorized(SESSION_NO_LONGER_VALID));
        }
        Err(err) => return Err(api_internal("Failed to load session", &err)),
    };
    Ok(Json(SessionResponse {
        admin: SessionAdmin {
            id: admin.id.to_string(),
            email: admin.email,
            name: admin.name,
            role: admin.role,
        },
        expires_at: claims.exp,
    }))
}

fn session_admin(claims: &SessionClaims) -> SessionAdmin {
    SessionAdmin {
        id: claims.sub.clone(),
        email: claims.email.clone(),
        name: claims.name.clone(),
        role: claims.role,
    }
}

//! Admin dashboard statistics.
use crate::api::error::{ApiError, registry_error};
use crate::app::AppState;
use crate::auth::session::require_admin;
use crate::query::DashboardStats;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

#[utoipa::path(
    get,
    path = "/v1/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Totals, per-type counts and recent certificates", body = DashboardStats),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, ApiError> {
    require_admin(&state, &headers)?;
    let stats = state
        .query
        .dashboard()
        .await
        .map_err(|err| registry_error("Failed to load dashboard", err))?;
    Ok(Json(stats))
}

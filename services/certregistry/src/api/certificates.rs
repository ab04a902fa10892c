//! Admin certificate API handlers.
//!
//! # Purpose and responsibility
//! CRUD, status changes, and layout preview for certificates. Every route but
//! `GET /v1/certificates/{id}` requires an admin bearer session.
//!
//! # Key invariants and assumptions
//! - Identity fields are assigned by the lifecycle layer, never by clients.
//! - Create returns 201; a second delete of the same id returns 404.
use crate::api::error::{ApiError, api_validation_error, registry_error};
use crate::api::types::{
    CertificateTypeInfo, CertificateTypesQuery, CertificateTypesResponse, DeleteResponse,
    ListQuery, StatusRequest,
};
use crate::api::{parse_certificate_id, render_layout};
use crate::app::AppState;
use crate::auth::session::require_admin;
use crate::lifecycle::{CertificateInput, parse_date};
use crate::model::{Certificate, CertificateStatus, CertificateType, default_expiration};
use crate::query::{CertificateFilter, CertificatePage, PageRequest};
use crate::render::Layout;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use std::str::FromStr;

#[utoipa::path(
    get,
    path = "/v1/certificates",
    tag = "certificates",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of certificates", body = CertificatePage),
        (status = 400, description = "Invalid filter", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// List certificates newest first.
///
/// Malformed `page`/`limit` values fall back to the defaults; unknown `type`
/// or `status` values are rejected.
pub(crate) async fn list_certificates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<CertificatePage>, ApiError> {
    require_admin(&state, &headers)?;
    let cert_type = parse_filter::<CertificateType>(query.cert_type.as_deref(), "Invalid type")?;
    let status = parse_filter::<CertificateStatus>(query.status.as_deref(), "Invalid status")?;
    let filter = CertificateFilter::new(cert_type, status, query.search.as_deref());
    let page = PageRequest::new(
        query.page.as_deref().and_then(|raw| raw.trim().parse().ok()),
        query.limit.as_deref().and_then(|raw| raw.trim().parse().ok()),
    );
    let page = state
        .query
        .list(&filter, page)
        .await
        .map_err(|err| registry_error("Failed to fetch certificates", err))?;
    Ok(Json(page))
}

/// Empty and `all` mean "no filter".
fn parse_filter<T: FromStr>(raw: Option<&str>, message: &str) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| api_validation_error(message)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/certificate-types",
    tag = "certificates",
    params(CertificateTypesQuery),
    responses(
        (status = 200, description = "Certificate types with default expirations", body = CertificateTypesResponse),
        (status = 400, description = "Invalid issue date", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Issuance form metadata: each type's prefix, display name and the
/// expiration date it would default to for `issueDate`.
pub(crate) async fn certificate_types(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CertificateTypesQuery>,
) -> Result<Json<CertificateTypesResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let issue_date = match query.issue_date.as_deref().map(str::trim) {
        None | Some("") => Utc::now().date_naive(),
        Some(raw) => parse_date("issueDate", raw)
            .map_err(|err| registry_error("Failed to list certificate types", err))?,
    };
    let types = CertificateType::ALL
        .into_iter()
        .map(|cert_type| CertificateTypeInfo {
            cert_type,
            prefix: cert_type.prefix().to_string(),
            display_name: cert_type.display_name().to_string(),
            validity_years: cert_type.default_validity_years(),
            default_expiration_date: default_expiration(cert_type, issue_date),
        })
        .collect();
    Ok(Json(CertificateTypesResponse { issue_date, types }))
}

#[utoipa::path(
    post,
    path = "/v1/certificates",
    tag = "certificates",
    request_body = CertificateInput,
    responses(
        (status = 201, description = "Certificate created", body = Certificate),
        (status = 400, description = "Missing or invalid fields", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Identity allocation exhausted", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn create_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CertificateInput>,
) -> Result<(StatusCode, Json<Certificate>), ApiError> {
    let claims = require_admin(&state, &headers)?;
    let created = state
        .lifecycle
        .create(body)
        .await
        .map_err(|err| registry_error("Failed to create certificate", err))?;
    tracing::info!(admin = %claims.sub, certificate_id = %created.id, "admin created certificate");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/v1/certificates/{id}",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Certificate", body = Certificate),
        (status = 404, description = "Unknown id", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
    let id = parse_certificate_id(&id)?;
    let certificate = state
        .lifecycle
        .get(id)
        .await
        .map_err(|err| registry_error("Failed to fetch certificate", err))?;
    Ok(Json(certificate))
}

#[utoipa::path(
    put,
    path = "/v1/certificates/{id}",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    request_body = CertificateInput,
    responses(
        (status = 200, description = "Certificate updated", body = Certificate),
        (status = 400, description = "Invalid fields", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown id", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Replace a certificate's editable fields.
///
/// Optional dates missing from the body are cleared.
pub(crate) async fn update_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CertificateInput>,
) -> Result<Json<Certificate>, ApiError> {
    require_admin(&state, &headers)?;
    let id = parse_certificate_id(&id)?;
    let updated = state
        .lifecycle
        .update(id, body)
        .await
        .map_err(|err| registry_error("Failed to update certificate", err))?;
    Ok(Json(updated))
}

#[utoipa::path(
    patch,
    path = "/v1/certificates/{id}/status",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status changed", body = Certificate),
        (status = 400, description = "Invalid status", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown id", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn set_certificate_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Certificate>, ApiError> {
    require_admin(&state, &headers)?;
    let id = parse_certificate_id(&id)?;
    let updated = state
        .lifecycle
        .set_status(id, &body.status)
        .await
        .map_err(|err| registry_error("Failed to update certificate status", err))?;
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/v1/certificates/{id}/toggle",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Status flipped", body = Certificate),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown id", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// ACTIVE becomes PAUSED; anything else becomes ACTIVE.
pub(crate) async fn toggle_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
    require_admin(&state, &headers)?;
    let id = parse_certificate_id(&id)?;
    let updated = state
        .lifecycle
        .toggle(id)
        .await
        .map_err(|err| registry_error("Failed to update certificate status", err))?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/v1/certificates/{id}",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Certificate deleted", body = DeleteResponse),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown id", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn delete_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let claims = require_admin(&state, &headers)?;
    let id = parse_certificate_id(&id)?;
    state
        .lifecycle
        .delete(id)
        .await
        .map_err(|err| registry_error("Failed to delete certificate", err))?;
    tracing::info!(admin = %claims.sub, certificate_id = %id, "admin deleted certificate");
    Ok(Json(DeleteResponse { success: true }))
}

#[utoipa::path(
    get,
    path = "/v1/certificates/{id}/layout",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Positioned template layout", body = Layout),
        (status = 401, description = "Not signed in", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown id", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Layout for the admin preview, regardless of status.
pub(crate) async fn certificate_layout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Layout>, ApiError> {
    require_admin(&state, &headers)?;
    let id = parse_certificate_id(&id)?;
    let certificate = state
        .lifecycle
        .get(id)
        .await
        .map_err(|err| registry_error("Failed to fetch certificate", err))?;
    let (layout, _) = render_layout(&state, &certificate);
    Ok(Json(layout))
}

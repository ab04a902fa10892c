//! Public, unauthenticated certificate lookups.
//!
//! # Purpose and responsibility
//! Search by name or number and view by slug, as JSON for API clients and as
//! an HTML page for browsers.
//!
//! # Security considerations
//! - Only ACTIVE certificates are searchable.
//! - PAUSED and REVOKED certificates expose their status and nothing else.
use crate::api::error::{ApiError, api_validation_error, registry_error};
use crate::api::render_layout;
use crate::api::types::{PublicCertificateResponse, SearchQuery, SearchResponse};
use crate::app::AppState;
use crate::error::RegistryError;
use crate::render::html;
use crate::verification::{PublicView, SEARCH_TOO_SHORT};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[utoipa::path(
    get,
    path = "/v1/search",
    tag = "public",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search outcome", body = SearchResponse),
        (status = 400, description = "Query too short", body = crate::api::types::ErrorResponse)
    )
)]
/// Find the newest ACTIVE certificate whose organization name or number
/// contains `q`.
pub(crate) async fn search_certificates(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Some(term) = query.q else {
        return Err(api_validation_error(SEARCH_TOO_SHORT));
    };
    let found = state
        .gate
        .search(&term)
        .await
        .map_err(|err| registry_error("Failed to search certificates", err))?;
    Ok(Json(SearchResponse {
        found: found.is_some(),
        certificate: found,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/public/certificates/{slug}",
    tag = "public",
    params(("slug" = String, Path, description = "Public lookup slug")),
    responses(
        (status = 200, description = "Certificate with layout, or a restricted notice", body = PublicCertificateResponse),
        (status = 404, description = "Unknown slug", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn public_certificate(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicCertificateResponse>, ApiError> {
    let view = state
        .gate
        .view_by_slug(&slug)
        .await
        .map_err(|err| registry_error("Failed to fetch certificate", err))?;
    Ok(Json(match view {
        PublicView::Available(certificate) => {
            let (layout, public_url) = render_layout(&state, &certificate);
            PublicCertificateResponse::Available {
                certificate,
                layout,
                public_url,
            }
        }
        PublicView::Restricted { status } => PublicCertificateResponse::Restricted { status },
    }))
}

/// Browser page for a slug: the certificate with a PNG download button, the
/// paused/revoked notice, or a not-found page.
pub(crate) async fn certificate_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match state.gate.view_by_slug(&slug).await {
        Ok(PublicView::Available(certificate)) => {
            let (layout, public_url) = render_layout(&state, &certificate);
            html::certificate_page(&certificate, &layout, &public_url).into_response()
        }
        Ok(PublicView::Restricted { status }) => html::restricted_page(status).into_response(),
        Err(RegistryError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, html::not_found_page()).into_response()
        }
        Err(err) => {
            tracing::error!(error = ?err, "certificate page lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, html::not_found_page()).into_response()
        }
    }
}

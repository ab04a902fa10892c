//! Registry HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules plus the small helpers they share: path id
//! parsing and layout rendering with an embedded QR code.
pub mod certificates;
pub mod dashboard;
pub mod error;
pub mod openapi;
pub mod public;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_not_found};
use crate::app::AppState;
use crate::model::Certificate;
use crate::render::{self, Layout};
use crate::verification::public_certificate_url;
use uuid::Uuid;

/// Unparseable ids cannot name a stored certificate, so they read as 404.
pub(crate) fn parse_certificate_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| api_not_found("Certificate not found"))
}

/// Render `certificate` with a QR code pointing at its public page.
///
/// QR failures degrade to a layout without the code.
pub(crate) fn render_layout(state: &AppState, certificate: &Certificate) -> (Layout, String) {
    let public_url = public_certificate_url(&state.public_base_url, &certificate.public_slug);
    let qr = match state.qr.encode(&public_url) {
        Ok(qr) => Some(qr),
        Err(err) => {
            tracing::warn!(error = %err, certificate_id = %certificate.id, "qr encoding failed");
            None
        }
    };
    (render::render(certificate, qr.as_deref()), public_url)
}

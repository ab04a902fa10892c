//! Registry HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth;
use crate::auth::token::SessionSigner;
use crate::identity::{IdentityGenerator, NanoidIdentity};
use crate::lifecycle::CertificateLifecycle;
use crate::observability;
use crate::qr::{QrEncoder, SvgQrEncoder};
use crate::query::CertificateQuery;
use crate::store::RegistryStore;
use crate::verification::VerificationGate;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub public_base_url: String,
    pub store: Arc<dyn RegistryStore + Send + Sync>,
    pub lifecycle: CertificateLifecycle,
    pub query: CertificateQuery,
    pub gate: VerificationGate,
    pub signer: SessionSigner,
    pub qr: Arc<dyn QrEncoder>,
}

impl AppState {
    /// State with nanoid identities and SVG QR codes.
    pub fn new(
        store: Arc<dyn RegistryStore + Send + Sync>,
        signer: SessionSigner,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self::with_identity(store, signer, public_base_url, Arc::new(NanoidIdentity::new()))
    }

    pub fn with_identity(
        store: Arc<dyn RegistryStore + Send + Sync>,
        signer: SessionSigner,
        public_base_url: impl Into<String>,
        identity: Arc<dyn IdentityGenerator>,
    ) -> Self {
        Self {
            api_version: "v1".to_string(),
            public_base_url: public_base_url.into(),
            lifecycle: CertificateLifecycle::new(store.clone(), identity),
            query: CertificateQuery::new(store.clone()),
            gate: VerificationGate::new(store.clone()),
            store,
            signer,
            qr: Arc::new(SvgQrEncoder),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/v1/auth/login", axum::routing::post(auth::login::login))
        .route(
            "/v1/auth/session",
            axum::routing::get(auth::login::current_session),
        )
        .route(
            "/v1/certificates",
            axum::routing::get(api::certificates::list_certificates)
                .post(api::certificates::create_certificate),
        )
        .route(
            "/v1/certificate-types",
            axum::routing::get(api::certificates::certificate_types),
        )
        .route(
            "/v1/certificates/:id",
            axum::routing::get(api::certificates::get_certificate)
                .put(api::certificates::update_certificate)
                .delete(api::certificates::delete_certificate),
        )
        .route(
            "/v1/certificates/:id/status",
            axum::routing::patch(api::certificates::set_certificate_status),
        )
        .route(
            "/v1/certificates/:id/toggle",
            axum::routing::post(api::certificates::toggle_certificate),
        )
        .route(
            "/v1/certificates/:id/layout",
            axum::routing::get(api::certificates::certificate_layout),
        )
        .route("/v1/dashboard", axum::routing::get(api::dashboard::dashboard))
        .route(
            "/v1/search",
            axum::routing::get(api::public::search_certificates),
        )
        .route(
            "/v1/public/certificates/:slug",
            axum::routing::get(api::public::public_certificate),
        )
        .route(
            "/certificate/:slug",
            axum::routing::get(api::public::certificate_page),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}

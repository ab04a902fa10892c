//! OpenAPI schema aggregation for the registry API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::types::{
    CertificateTypeInfo, CertificateTypesResponse, DeleteResponse, ErrorResponse, HealthStatus,
    LoginRequest, LoginResponse, PublicCertificateResponse, SearchResponse, SessionAdmin,
    SessionResponse, StatusRequest, SystemInfo,
};
use crate::api::{certificates, dashboard, public, system};
use crate::auth::login;
use crate::lifecycle::CertificateInput;
use crate::model::{AdminRole, Certificate, CertificateStatus, CertificateType};
use crate::query::{CertificatePage, DashboardStats, Pagination, TypeCount};
use crate::render::{Anchor, Background, Content, Element, Layout, TemplateKind, TextStyle};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "certregistry",
        version = "v1",
        description = "Certificate issuance and public verification API"
    ),
    paths(
        system::system_info,
        system::system_health,
        login::login,
        login::current_session,
        certificates::list_certificates,
        certificates::certificate_types,
        certificates::create_certificate,
        certificates::get_certificate,
        certificates::update_certificate,
        certificates::set_certificate_status,
        certificates::toggle_certificate,
        certificates::delete_certificate,
        certificates::certificate_layout,
        dashboard::dashboard,
        public::search_certificates,
        public::public_certificate
    ),
    components(schemas(
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        LoginRequest,
        LoginResponse,
        SessionAdmin,
        SessionResponse,
        AdminRole,
        Certificate,
        CertificateType,
        CertificateStatus,
        CertificateInput,
        CertificateTypeInfo,
        CertificateTypesResponse,
        CertificatePage,
        Pagination,
        StatusRequest,
        DeleteResponse,
        DashboardStats,
        TypeCount,
        SearchResponse,
        PublicCertificateResponse,
        Layout,
        TemplateKind,
        Background,
        Anchor,
        Element,
        Content,
        TextStyle
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "system", description = "Service metadata and health"),
        (name = "auth", description = "Admin sessions"),
        (name = "certificates", description = "Certificate administration"),
        (name = "dashboard", description = "Admin statistics"),
        (name = "public", description = "Unauthenticated verification")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

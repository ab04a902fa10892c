//! HTTP API request/response types.
//!
//! # Purpose
//! Payload shapes for the registry REST API and OpenAPI schema generation.
//! Domain types (`Certificate`, `Layout`, `CertificatePage`) are returned
//! directly; this module holds the envelopes around them.
use crate::model::{AdminRole, Certificate, CertificateStatus, CertificateType};
use chrono::NaiveDate;
use crate::render::Layout;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub service: String,
    pub api_version: String,
    pub storage_backend: String,
    pub durable_storage: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Admin list parameters. Kept as strings so malformed numbers fall back to
/// defaults and malformed enums produce a 400 instead of a rejection.
#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub cert_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CertificateTypesQuery {
    /// `YYYY-MM-DD`; defaults to today (UTC).
    pub issue_date: Option<String>,
}

/// Per-type metadata for the issuance form.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CertificateTypeInfo {
    #[serde(rename = "type")]
    pub cert_type: CertificateType,
    pub prefix: String,
    pub display_name: String,
    pub validity_years: u32,
    pub default_expiration_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CertificateTypesResponse {
    pub issue_date: NaiveDate,
    pub types: Vec<CertificateTypeInfo>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SearchResponse {
    pub found: bool,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PublicCertificateResponse {
    Available {
        certificate: Certificate,
        layout: Layout,
        #[serde(rename = "publicUrl")]
        public_url: String,
    },
    Restricted { status: CertificateStatus },
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionAdmin {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub admin: SessionAdmin,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub admin: SessionAdmin,
    pub expires_at: i64,
}

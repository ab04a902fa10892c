//! Storage contracts for the certificate registry.
//!
//! # Purpose
//! Defines the async traits implemented by the in-memory and Postgres
//! backends, plus the shared error type handlers and the lifecycle layer match
//! on.
//!
//! # Key invariants
//! - `certificate_number` and `public_slug` are unique; a duplicate insert
//!   yields [`StoreError::Conflict`].
//! - Lists are ordered newest first with a stable tiebreak.
use crate::model::{AdminUser, Certificate, CertificateStatus, CertificateType};
use crate::query::CertificateFilter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Number of certificates sharing one (type, status) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakdownRow {
    pub cert_type: CertificateType,
    pub status: CertificateStatus,
    pub count: u64,
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn insert_certificate(&self, certificate: Certificate) -> StoreResult<Certificate>;
    async fn get_certificate(&self, id: Uuid) -> StoreResult<Certificate>;
    async fn find_certificate_by_slug(&self, slug: &str) -> StoreResult<Option<Certificate>>;
    async fn find_certificate_by_number(&self, number: &str) -> StoreResult<Option<Certificate>>;
    /// Overwrite every mutable column. Identity columns and `created_at` are
    /// left untouched.
    async fn update_certificate(&self, certificate: Certificate) -> StoreResult<Certificate>;
    async fn set_certificate_status(
        &self,
        id: Uuid,
        status: CertificateStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Certificate>;
    async fn delete_certificate(&self, id: Uuid) -> StoreResult<()>;
    async fn list_certificates(
        &self,
        filter: &CertificateFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Certificate>>;
    async fn count_certificates(&self, filter: &CertificateFilter) -> StoreResult<u64>;
    async fn certificate_breakdown(&self) -> StoreResult<Vec<BreakdownRow>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Insert or replace the admin with the same email.
    async fn upsert_admin(&self, admin: AdminUser) -> StoreResult<AdminUser>;
    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>>;
    async fn get_admin(&self, id: Uuid) -> StoreResult<AdminUser>;
}

pub trait RegistryStore: CertificateStore + AdminStore {}

impl<T> RegistryStore for T where T: CertificateStore + AdminStore {}

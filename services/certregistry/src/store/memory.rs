//! In-memory implementation of the registry store.
//!
//! # Purpose
//! Implements [`CertificateStore`] and [`AdminStore`] with `HashMap`s guarded by
//! `tokio::sync::RwLock`. It backs local development, tests, and deployments
//! that do not configure Postgres.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Writes are serialized by a single write lock over the certificate table,
//!   so uniqueness checks and inserts are atomic with respect to each other.
//!
//! # Ordering
//! Every insert is stamped with a process-local sequence number. Lists sort by
//! `created_at` descending and fall back to the sequence (newest first) when
//! timestamps tie, which keeps pagination stable.
use super::{AdminStore, BreakdownRow, CertificateStore, StoreError, StoreResult};
use crate::model::{AdminUser, Certificate, CertificateStatus, CertificateType};
use crate::query::CertificateFilter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct CertificateTable {
    next_seq: u64,
    rows: HashMap<Uuid, (u64, Certificate)>,
    by_number: HashMap<String, Uuid>,
    by_slug: HashMap<String, Uuid>,
}

impl CertificateTable {
    fn sorted<'a>(&'a self, filter: &'a CertificateFilter) -> Vec<&'a (u64, Certificate)> {
        let mut matches: Vec<_> = self
            .rows
            .values()
            .filter(|(_, cert)| filter.matches(cert))
            .collect();
        matches.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        matches
    }
}

/// In-memory registry store.
///
/// Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    certificates: Arc<RwLock<CertificateTable>>,
    /// Admin users keyed by lowercase email.
    admins: Arc<RwLock<HashMap<String, AdminUser>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateStore for InMemoryStore {
    async fn insert_certificate(&self, certificate: Certificate) -> StoreResult<Certificate> {
        let mut table = self.certificates.write().await;
        if table.rows.contains_key(&certificate.id) {
            return Err(StoreError::Conflict("certificate id exists".into()));
        }
        if table.by_number.contains_key(&certificate.certificate_number) {
            return Err(StoreError::Conflict("certificate number exists".into()));
        }
        if table.by_slug.contains_key(&certificate.public_slug) {
            return Err(StoreError::Conflict("public slug exists".into()));
        }
        let seq = table.next_seq;
        table.next_seq += 1;
        table
            .by_number
            .insert(certificate.certificate_number.clone(), certificate.id);
        table
            .by_slug
            .insert(certificate.public_slug.clone(), certificate.id);
        table
            .rows
            .insert(certificate.id, (seq, certificate.clone()));
        metrics::counter!("certreg_certificate_changes_total", "op" => "created").increment(1);
        metrics::gauge!("certreg_certificates_total").set(table.rows.len() as f64);
        Ok(certificate)
    }

    async fn get_certificate(&self, id: Uuid) -> StoreResult<Certificate> {
        self.certificates
            .read()
            .await
            .rows
            .get(&id)
            .map(|(_, cert)| cert.clone())
            .ok_or_else(|| StoreError::NotFound("certificate".into()))
    }

    async fn find_certificate_by_slug(&self, slug: &str) -> StoreResult<Option<Certificate>> {
        let table = self.certificates.read().await;
        Ok(table
            .by_slug
            .get(slug)
            .and_then(|id| table.rows.get(id))
            .map(|(_, cert)| cert.clone()))
    }

    async fn find_certificate_by_number(&self, number: &str) -> StoreResult<Option<Certificate>> {
        let table = self.certificates.read().await;
        Ok(table
            .by_number
            .get(number)
            .and_then(|id| table.rows.get(id))
            .map(|(_, cert)| cert.clone()))
    }

    async fn update_certificate(&self, certificate: Certificate) -> StoreResult<Certificate> {
        let mut table = self.certificates.write().await;
        let (_, existing) = table
            .rows
            .get_mut(&certificate.id)
            .ok_or_else(|| StoreError::NotFound("certificate".into()))?;
        let updated = Certificate {
            id: existing.id,
            certificate_number: existing.certificate_number.clone(),
            public_slug: existing.public_slug.clone(),
            created_at: existing.created_at,
            ..certificate
        };
        *existing = updated.clone();
        metrics::counter!("certreg_certificate_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn set_certificate_status(
        &self,
        id: Uuid,
        status: CertificateStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Certificate> {
        let mut table = self.certificates.write().await;
        let (_, existing) = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("certificate".into()))?;
        existing.status = status;
        existing.updated_at = updated_at;
        metrics::counter!("certreg_certificate_changes_total", "op" => "status").increment(1);
        Ok(existing.clone())
    }

    async fn delete_certificate(&self, id: Uuid) -> StoreResult<()> {
        let mut table = self.certificates.write().await;
        let (_, removed) = table
            .rows
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound("certificate".into()))?;
        table.by_number.remove(&removed.certificate_number);
        table.by_slug.remove(&removed.public_slug);
        metrics::counter!("certreg_certificate_changes_total", "op" => "deleted").increment(1);
        metrics::gauge!("certreg_certificates_total").set(table.rows.len() as f64);
        Ok(())
    }

    async fn list_certificates(
        &self,
        filter: &CertificateFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Certificate>> {
        let table = self.certificates.read().await;
        Ok(table
            .sorted(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, cert)| cert.clone())
            .collect())
    }

    async fn count_certificates(&self, filter: &CertificateFilter) -> StoreResult<u64> {
        let table = self.certificates.read().await;
        Ok(table
            .rows
            .values()
            .filter(|(_, cert)| filter.matches(cert))
            .count() as u64)
    }

    async fn certificate_breakdown(&self) -> StoreResult<Vec<BreakdownRow>> {
        let table = self.certificates.read().await;
        let mut counts: HashMap<(CertificateType, CertificateStatus), u64> = HashMap::new();
        for (_, cert) in table.rows.values() {
            *counts.entry((cert.cert_type, cert.status)).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((cert_type, status), count)| BreakdownRow {
                cert_type,
                status,
                count,
            })
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl AdminStore for InMemoryStore {
    async fn upsert_admin(&self, admin: AdminUser) -> StoreResult<AdminUser> {
        let mut admins = self.admins.write().await;
        let key = admin.email.to_lowercase();
        let stored = match admins.get(&key) {
            Some(existing) => AdminUser {
                id: existing.id,
                created_at: existing.created_at,
                ..admin
            },
            None => admin,
        };
        admins.insert(key, stored.clone());
        Ok(stored)
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        Ok(self.admins.read().await.get(&email.to_lowercase()).cloned())
    }

    async fn get_admin(&self, id: Uuid) -> StoreResult<AdminUser> {
        self.admins
            .read()
            .await
            .values()
            .find(|admin| admin.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("admin".into()))
    }
}

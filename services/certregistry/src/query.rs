//! Paginated, filtered certificate listing and dashboard aggregates.
//!
//! # Purpose
//! Turns loosely typed list parameters into a [`CertificateFilter`] plus a
//! clamped page window, then runs the page and count queries concurrently.
//!
//! # Key invariants
//! - `page` is 1-based; `limit` is clamped to `1..=MAX_LIMIT`.
//! - Filters combine with AND; the free-text term is an OR over the
//!   organization name and certificate number, case-insensitive substring.
//! - `pages = ceil(total / limit)`.
use crate::error::RegistryResult;
use crate::model::{Certificate, CertificateStatus, CertificateType};
use crate::store::RegistryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
pub const RECENT_LIMIT: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateFilter {
    pub cert_type: Option<CertificateType>,
    pub status: Option<CertificateStatus>,
    search: Option<String>,
}

impl CertificateFilter {
    pub fn new(
        cert_type: Option<CertificateType>,
        status: Option<CertificateStatus>,
        search: Option<&str>,
    ) -> Self {
        Self {
            cert_type,
            status,
            search: search
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string),
        }
    }

    /// Public lookups only ever see ACTIVE certificates. The term is matched
    /// as given, surrounding whitespace included.
    pub fn public_search(term: &str) -> Self {
        Self {
            cert_type: None,
            status: Some(CertificateStatus::Active),
            search: Some(term.to_string()).filter(|term| !term.is_empty()),
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn matches(&self, certificate: &Certificate) -> bool {
        if let Some(cert_type) = self.cert_type
            && certificate.cert_type != cert_type
        {
            return false;
        }
        if let Some(status) = self.status
            && certificate.status != status
        {
            return false;
        }
        match self.search() {
            Some(term) => {
                let term = term.to_lowercase();
                certificate.organization_name.to_lowercase().contains(&term)
                    || certificate.certificate_number.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Pages past the point where the row offset would leave `i64` range are
    /// clamped, so the offset always binds as a SQL BIGINT.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let max_page = i64::MAX as u64 / limit;
        Self {
            page: page.unwrap_or(1).clamp(1, max_page),
            limit,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CertificatePage {
    pub certificates: Vec<Certificate>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub cert_type: CertificateType,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: u64,
    pub active: u64,
    pub paused: u64,
    pub by_type: Vec<TypeCount>,
    pub recent: Vec<Certificate>,
}

#[derive(Clone)]
pub struct CertificateQuery {
    store: Arc<dyn RegistryStore + Send + Sync>,
}

impl CertificateQuery {
    pub fn new(store: Arc<dyn RegistryStore + Send + Sync>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &CertificateFilter,
        page: PageRequest,
    ) -> RegistryResult<CertificatePage> {
        let (certificates, total) = tokio::join!(
            self.store
                .list_certificates(filter, page.offset(), page.limit),
            self.store.count_certificates(filter)
        );
        let certificates = certificates?;
        let total = total?;
        Ok(CertificatePage {
            certificates,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total,
                pages: total.div_ceil(page.limit),
            },
        })
    }

    pub async fn dashboard(&self) -> RegistryResult<DashboardStats> {
        let filter = CertificateFilter::default();
        let (breakdown, recent) = tokio::join!(
            self.store.certificate_breakdown(),
            self.store.list_certificates(&filter, 0, RECENT_LIMIT)
        );
        let breakdown = breakdown?;
        let mut stats = DashboardStats {
            total: 0,
            active: 0,
            paused: 0,
            by_type: CertificateType::ALL
                .into_iter()
                .map(|cert_type| TypeCount {
                    cert_type,
                    count: 0,
                })
                .collect(),
            recent: recent?,
        };
        for row in breakdown {
            stats.total += row.count;
            match row.status {
                CertificateStatus::Active => stats.active += row.count,
                CertificateStatus::Paused => stats.paused += row.count,
                CertificateStatus::Expired | CertificateStatus::Revoked => {}
            }
            if let Some(entry) = stats
                .by_type
                .iter_mut()
                .find(|entry| entry.cert_type == row.cert_type)
            {
                entry.count += row.count;
            }
        }
        Ok(stats)
    }
}

//! Public, unauthenticated read path.
//!
//! # Purpose
//! Enforces the visibility rules for anonymous visitors: search only ever
//! matches ACTIVE certificates, and a PAUSED or REVOKED certificate reached by
//! its slug yields a restricted signal carrying nothing but its status.
use crate::error::{RegistryError, RegistryResult};
use crate::model::{Certificate, CertificateStatus};
use crate::query::CertificateFilter;
use crate::store::RegistryStore;
use std::sync::Arc;

pub const MIN_SEARCH_CHARS: usize = 2;
pub const SEARCH_TOO_SHORT: &str = "Search query must be at least 2 characters";

#[derive(Debug, Clone, PartialEq)]
pub enum PublicView {
    Available(Certificate),
    Restricted { status: CertificateStatus },
}

#[derive(Clone)]
pub struct VerificationGate {
    store: Arc<dyn RegistryStore + Send + Sync>,
}

impl VerificationGate {
    pub fn new(store: Arc<dyn RegistryStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Most recently created ACTIVE certificate whose organization name or
    /// number contains `query`, ignoring case. Only the length check ignores
    /// surrounding whitespace; matching uses the query untrimmed.
    pub async fn search(&self, query: &str) -> RegistryResult<Option<Certificate>> {
        if query.trim().chars().count() < MIN_SEARCH_CHARS {
            return Err(RegistryError::validation(SEARCH_TOO_SHORT));
        }
        let found = self
            .store
            .list_certificates(&CertificateFilter::public_search(query), 0, 1)
            .await?
            .into_iter()
            .next();
        let outcome = if found.is_some() { "found" } else { "not_found" };
        metrics::counter!("certreg_public_lookups_total", "kind" => "search", "outcome" => outcome)
            .increment(1);
        Ok(found)
    }

    pub async fn view_by_slug(&self, slug: &str) -> RegistryResult<PublicView> {
        let Some(certificate) = self.store.find_certificate_by_slug(slug).await? else {
            metrics::counter!("certreg_public_lookups_total", "kind" => "slug", "outcome" => "not_found")
                .increment(1);
            return Err(RegistryError::NotFound("certificate".into()));
        };
        if certificate.status.is_restricted() {
            metrics::counter!("certreg_public_lookups_total", "kind" => "slug", "outcome" => "restricted")
                .increment(1);
            tracing::debug!(slug, status = %certificate.status, "restricted certificate requested");
            return Ok(PublicView::Restricted {
                status: certificate.status,
            });
        }
        metrics::counter!("certreg_public_lookups_total", "kind" => "slug", "outcome" => "found")
            .increment(1);
        Ok(PublicView::Available(certificate))
    }
}

/// Absolute share link for a slug.
pub fn public_certificate_url(base_url: &str, slug: &str) -> String {
    format!("{}/certificate/{slug}", base_url.trim_end_matches('/'))
}

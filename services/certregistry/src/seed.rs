//! Startup data: the bootstrap admin and optional demo certificates.
//!
//! Both steps are idempotent. The admin is upserted by email so a changed
//! password in configuration takes effect on restart; demo certificates are
//! inserted only when their number is not already taken.
use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;
use crate::model::{AdminRole, AdminUser, Certificate, CertificateStatus, CertificateType};
use crate::store::{RegistryStore, StoreError};
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

pub async fn ensure_bootstrap_admin(
    store: &dyn RegistryStore,
    admin: &BootstrapAdmin,
) -> Result<AdminUser> {
    let password_hash =
        hash_password(&admin.password).map_err(|err| anyhow!("hash bootstrap password: {err}"))?;
    let stored = store
        .upsert_admin(AdminUser {
            id: Uuid::new_v4(),
            email: admin.email.trim().to_string(),
            name: admin.name.clone(),
            password_hash,
            role: AdminRole::SuperAdmin,
            created_at: Utc::now(),
        })
        .await
        .context("upsert bootstrap admin")?;
    tracing::info!(admin_id = %stored.id, email = %stored.email, "bootstrap admin ready");
    Ok(stored)
}

/// Insert the three demo certificates that are missing. Returns how many were
/// inserted.
pub async fn seed_demo_certificates(store: &dyn RegistryStore) -> Result<usize> {
    let mut inserted = 0;
    for certificate in demo_certificates()? {
        let number = certificate.certificate_number.clone();
        if store
            .find_certificate_by_number(&number)
            .await
            .context("look up demo certificate")?
            .is_some()
        {
            continue;
        }
        match store.insert_certificate(certificate).await {
            Ok(_) => {
                inserted += 1;
                tracing::info!(certificate_number = %number, "demo certificate seeded");
            }
            // Another replica seeded it first.
            Err(StoreError::Conflict(_)) => {}
            Err(err) => return Err(err).context("insert demo certificate"),
        }
    }
    Ok(inserted)
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid demo date {year}-{month}-{day}"))
}

fn demo_certificates() -> Result<Vec<Certificate>> {
    let now = Utc::now();
    let blank = |number: &str,
                 slug: &str,
                 cert_type: CertificateType,
                 name: &str,
                 address: &str| Certificate {
        id: Uuid::new_v4(),
        certificate_number: number.to_string(),
        public_slug: slug.to_string(),
        cert_type,
        status: CertificateStatus::Active,
        organization_name: name.to_string(),
        address: address.to_string(),
        issue_date: NaiveDate::MIN,
        expiration_date: NaiveDate::MIN,
        qualifications: None,
        membership_date: None,
        accredited_as: None,
        scope: None,
        issue_no: None,
        initial_accreditation_date: None,
        created_at: now,
        updated_at: now,
    };

    let individual = Certificate {
        qualifications: Some("Certified Management Consultant".to_string()),
        issue_date: date(2024, 1, 15)?,
        expiration_date: date(2026, 1, 15)?,
        membership_date: Some(date(2024, 1, 15)?),
        ..blank(
            "AAA-IM-2024-DEMO01",
            "demo-individual-001",
            CertificateType::IndividualMembership,
            "John Smith Consulting",
            "123 Business Ave, New York, NY 10001",
        )
    };
    let accreditation = Certificate {
        accredited_as: Some("ISO 17025:2017".to_string()),
        scope: Some("Chemical Testing Laboratory".to_string()),
        issue_no: Some("001".to_string()),
        issue_date: date(2024, 3, 1)?,
        expiration_date: date(2027, 3, 1)?,
        initial_accreditation_date: Some(date(2024, 3, 1)?),
        ..blank(
            "AAA-AC-2024-DEMO02",
            "demo-accreditation-001",
            CertificateType::Accreditation,
            "Excellence Labs Inc.",
            "456 Innovation Blvd, San Francisco, CA 94102",
        )
    };
    let organizational = Certificate {
        issue_date: date(2024, 6, 1)?,
        expiration_date: date(2025, 6, 1)?,
        membership_date: Some(date(2024, 6, 1)?),
        ..blank(
            "AAA-OM-2024-DEMO03",
            "demo-organizational-001",
            CertificateType::OrganizationalMembership,
            "Global Tech Solutions",
            "789 Enterprise Way, Austin, TX 78701",
        )
    };
    Ok(vec![individual, accreditation, organizational])
}

//! Certificate lifecycle: create, read, update, status changes, delete.
//!
//! # Purpose
//! Owns the validation rules for admin mutations and the bounded retry that
//! re-rolls identities when the store reports a uniqueness conflict.
//!
//! # Key invariants
//! - New certificates always start ACTIVE with freshly generated identities.
//! - Identity columns and `created_at` never change after creation.
//! - On update, absent `membershipDate`/`initialAccreditationDate` are cleared,
//!   absent `issueDate`/`expirationDate` are kept, and any other absent field
//!   keeps its stored value. An empty string clears an optional text field.
use crate::error::{RegistryError, RegistryResult};
use crate::identity::IdentityGenerator;
use crate::model::{Certificate, CertificateStatus, CertificateType};
use crate::store::{RegistryStore, StoreError};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Attempts at generating a unique number/slug pair before giving up.
pub const MAX_IDENTITY_ATTEMPTS: usize = 5;

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

/// Admin-submitted certificate fields for create and update.
///
/// Everything is optional and loosely typed so that missing, empty and
/// unparsable values are all reported as validation errors rather than body
/// rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInput {
    #[serde(rename = "type")]
    pub cert_type: Option<String>,
    /// Ignored on create.
    pub status: Option<String>,
    pub organization_name: Option<String>,
    pub address: Option<String>,
    pub issue_date: Option<String>,
    pub expiration_date: Option<String>,
    pub qualifications: Option<String>,
    pub membership_date: Option<String>,
    pub accredited_as: Option<String>,
    pub scope: Option<String>,
    pub issue_no: Option<String>,
    pub initial_accreditation_date: Option<String>,
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq)]
struct NewCertificate {
    cert_type: CertificateType,
    organization_name: String,
    address: String,
    issue_date: NaiveDate,
    expiration_date: NaiveDate,
    qualifications: Option<String>,
    membership_date: Option<NaiveDate>,
    accredited_as: Option<String>,
    scope: Option<String>,
    issue_no: Option<String>,
    initial_accreditation_date: Option<NaiveDate>,
}

impl NewCertificate {
    fn from_input(input: CertificateInput) -> RegistryResult<Self> {
        let (
            Some(cert_type),
            Some(organization_name),
            Some(address),
            Some(issue_date),
            Some(expiration_date),
        ) = (
            present(input.cert_type),
            present(input.organization_name),
            present(input.address),
            present(input.issue_date),
            present(input.expiration_date),
        )
        else {
            return Err(RegistryError::validation(MISSING_REQUIRED_FIELDS));
        };
        Ok(Self {
            cert_type: parse_type(&cert_type)?,
            organization_name,
            address,
            issue_date: parse_date("issueDate", &issue_date)?,
            expiration_date: parse_date("expirationDate", &expiration_date)?,
            qualifications: present(input.qualifications),
            membership_date: parse_optional_date("membershipDate", input.membership_date)?,
            accredited_as: present(input.accredited_as),
            scope: present(input.scope),
            issue_no: present(input.issue_no),
            initial_accreditation_date: parse_optional_date(
                "initialAccreditationDate",
                input.initial_accreditation_date,
            )?,
        })
    }

    fn into_certificate(
        self,
        certificate_number: String,
        public_slug: String,
        now: DateTime<Utc>,
    ) -> Certificate {
        Certificate {
            id: Uuid::new_v4(),
            certificate_number,
            public_slug,
            cert_type: self.cert_type,
            status: CertificateStatus::Active,
            organization_name: self.organization_name,
            address: self.address,
            issue_date: self.issue_date,
            expiration_date: self.expiration_date,
            qualifications: self.qualifications,
            membership_date: self.membership_date,
            accredited_as: self.accredited_as,
            scope: self.scope,
            issue_no: self.issue_no,
            initial_accreditation_date: self.initial_accreditation_date,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone)]
pub struct CertificateLifecycle {
    store: Arc<dyn RegistryStore + Send + Sync>,
    identity: Arc<dyn IdentityGenerator>,
}

impl CertificateLifecycle {
    pub fn new(
        store: Arc<dyn RegistryStore + Send + Sync>,
        identity: Arc<dyn IdentityGenerator>,
    ) -> Self {
        Self { store, identity }
    }

    pub async fn create(&self, input: CertificateInput) -> RegistryResult<Certificate> {
        let draft = NewCertificate::from_input(input)?;
        let now = Utc::now();
        for attempt in 1..=MAX_IDENTITY_ATTEMPTS {
            let certificate = draft.clone().into_certificate(
                self.identity.certificate_number(draft.cert_type, now.year()),
                self.identity.public_slug(),
                now,
            );
            match self.store.insert_certificate(certificate).await {
                Ok(created) => {
                    tracing::info!(
                        certificate_id = %created.id,
                        certificate_number = %created.certificate_number,
                        cert_type = %created.cert_type,
                        "certificate created"
                    );
                    return Ok(created);
                }
                Err(StoreError::Conflict(reason)) => {
                    metrics::counter!("certreg_identity_conflicts_total").increment(1);
                    tracing::warn!(attempt, %reason, "certificate identity collision");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(RegistryError::Conflict(
            "could not allocate a unique certificate identity".into(),
        ))
    }

    pub async fn get(&self, id: Uuid) -> RegistryResult<Certificate> {
        Ok(self.store.get_certificate(id).await?)
    }

    pub async fn update(&self, id: Uuid, input: CertificateInput) -> RegistryResult<Certificate> {
        let existing = self.store.get_certificate(id).await?;
        let replacement = apply_update(existing, input, Utc::now())?;
        let updated = self.store.update_certificate(replacement).await?;
        tracing::info!(certificate_id = %updated.id, "certificate updated");
        Ok(updated)
    }

    pub async fn set_status(&self, id: Uuid, status: &str) -> RegistryResult<Certificate> {
        let status = status
            .parse::<CertificateStatus>()
            .map_err(|_| RegistryError::validation("Invalid status"))?;
        self.write_status(id, status).await
    }

    /// ACTIVE becomes PAUSED; any other status becomes ACTIVE.
    pub async fn toggle(&self, id: Uuid) -> RegistryResult<Certificate> {
        let current = self.store.get_certificate(id).await?;
        self.write_status(id, current.status.toggled()).await
    }

    pub async fn delete(&self, id: Uuid) -> RegistryResult<()> {
        self.store.delete_certificate(id).await?;
        tracing::info!(certificate_id = %id, "certificate deleted");
        Ok(())
    }

    async fn write_status(
        &self,
        id: Uuid,
        status: CertificateStatus,
    ) -> RegistryResult<Certificate> {
        let updated = self
            .store
            .set_certificate_status(id, status, Utc::now())
            .await?;
        metrics::counter!("certreg_status_changes_total", "status" => status.as_str())
            .increment(1);
        tracing::info!(certificate_id = %id, %status, "certificate status changed");
        Ok(updated)
    }
}

fn apply_update(
    mut certificate: Certificate,
    input: CertificateInput,
    now: DateTime<Utc>,
) -> RegistryResult<Certificate> {
    if let Some(value) = input.cert_type {
        certificate.cert_type = parse_type(value.trim())?;
    }
    if let Some(value) = input.status {
        certificate.status = value
            .trim()
            .parse()
            .map_err(|_| RegistryError::validation("Invalid status"))?;
    }
    if let Some(value) = input.organization_name {
        certificate.organization_name = required_text("organizationName", value)?;
    }
    if let Some(value) = input.address {
        certificate.address = required_text("address", value)?;
    }
    if let Some(value) = present(input.issue_date) {
        certificate.issue_date = parse_date("issueDate", &value)?;
    }
    if let Some(value) = present(input.expiration_date) {
        certificate.expiration_date = parse_date("expirationDate", &value)?;
    }
    if let Some(value) = input.qualifications {
        certificate.qualifications = present(Some(value));
    }
    if let Some(value) = input.accredited_as {
        certificate.accredited_as = present(Some(value));
    }
    if let Some(value) = input.scope {
        certificate.scope = present(Some(value));
    }
    if let Some(value) = input.issue_no {
        certificate.issue_no = present(Some(value));
    }
    certificate.membership_date = parse_optional_date("membershipDate", input.membership_date)?;
    certificate.initial_accreditation_date = parse_optional_date(
        "initialAccreditationDate",
        input.initial_accreditation_date,
    )?;
    certificate.updated_at = now;
    Ok(certificate)
}

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required_text(field: &str, value: String) -> RegistryResult<String> {
    present(Some(value)).ok_or_else(|| RegistryError::validation(format!("{field} must not be empty")))
}

fn parse_type(value: &str) -> RegistryResult<CertificateType> {
    value
        .parse()
        .map_err(|_| RegistryError::validation(format!("Invalid certificate type: {value}")))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its UTC calendar date).
pub fn parse_date(field: &str, value: &str) -> RegistryResult<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc).date_naive())
        .map_err(|_| RegistryError::validation(format!("Invalid {field}: expected YYYY-MM-DD")))
}

fn parse_optional_date(field: &str, value: Option<String>) -> RegistryResult<Option<NaiveDate>> {
    present(value)
        .map(|value| parse_date(field, &value))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::NanoidIdentity;
    use crate::store::memory::InMemoryStore;
    use crate::store::{CertificateStore, StoreResult};
    use crate::test_support::ScriptedIdentity;

    fn accreditation_input() -> CertificateInput {
        CertificateInput {
            cert_type: Some("ACCREDITATION".into()),
            organization_name: Some("Acme Testing Lab".into()),
            address: Some("1 Main St".into()),
            issue_date: Some("2024-01-15".into()),
            expiration_date: Some("2027-01-15".into()),
            accredited_as: Some("ISO 17025:2017".into()),
            scope: Some("Chemical Testing Laboratory".into()),
            issue_no: Some("001".into()),
            initial_accreditation_date: Some("2020-06-01".into()),
            ..CertificateInput::default()
        }
    }

    fn lifecycle_with(identity: Arc<dyn IdentityGenerator>) -> (Arc<InMemoryStore>, CertificateLifecycle) {
        let store = Arc::new(InMemoryStore::new());
        let lifecycle = CertificateLifecycle::new(store.clone(), identity);
        (store, lifecycle)
    }

    #[tokio::test]
    async fn create_assigns_identity_and_active_status() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let created = lifecycle
            .create(CertificateInput {
                status: Some("REVOKED".into()),
                ..accreditation_input()
            })
            .await
            .expect("create");
        assert_eq!(created.status, CertificateStatus::Active);
        assert_eq!(created.public_slug.chars().count(), 12);
        let year = Utc::now().year();
        assert!(
            created
                .certificate_number
                .starts_with(&format!("AAA-AC-{year}-"))
        );
        assert_eq!(created.issue_date, NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"));
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_missing_or_blank_required_fields() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        for input in [
            CertificateInput {
                organization_name: None,
                ..accreditation_input()
            },
            CertificateInput {
                address: Some("   ".into()),
                ..accreditation_input()
            },
            CertificateInput {
                cert_type: None,
                ..accreditation_input()
            },
        ] {
            let err = lifecycle.create(input).await.expect_err("missing field");
            match err {
                RegistryError::Validation(message) => assert_eq!(message, MISSING_REQUIRED_FIELDS),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn create_rejects_unparsable_type_and_dates() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let err = lifecycle
            .create(CertificateInput {
                cert_type: Some("GOLD".into()),
                ..accreditation_input()
            })
            .await
            .expect_err("bad type");
        assert!(matches!(err, RegistryError::Validation(_)));

        let err = lifecycle
            .create(CertificateInput {
                issue_date: Some("15/01/2024".into()),
                ..accreditation_input()
            })
            .await
            .expect_err("bad date");
        assert!(matches!(err, RegistryError::Validation(message) if message.contains("issueDate")));
    }

    #[tokio::test]
    async fn create_rerolls_identity_after_conflict() {
        let identity = Arc::new(ScriptedIdentity::new(
            &["AAA-AC-2024-AAAAAA", "AAA-AC-2024-AAAAAA", "AAA-AC-2024-BBBBBB"],
            &["slug-one-0001", "slug-two-0002", "slug-three-03"],
        ));
        let (store, lifecycle) = lifecycle_with(identity.clone());

        let first = lifecycle.create(accreditation_input()).await.expect("first");
        assert_eq!(first.certificate_number, "AAA-AC-2024-AAAAAA");

        let second = lifecycle.create(accreditation_input()).await.expect("second");
        assert_eq!(second.certificate_number, "AAA-AC-2024-BBBBBB");
        assert_eq!(second.public_slug, "slug-three-03");
        assert_eq!(identity.numbers_issued(), 3);
        assert_eq!(
            store
                .count_certificates(&Default::default())
                .await
                .expect("count"),
            2
        );
    }

    #[tokio::test]
    async fn create_gives_up_after_bounded_attempts() {
        fn zeros(size: usize) -> Vec<u8> {
            vec![0; size]
        }
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::with_random(zeros)));
        lifecycle.create(accreditation_input()).await.expect("first");
        let err = lifecycle
            .create(accreditation_input())
            .await
            .expect_err("exhausted");
        assert!(matches!(err, RegistryError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let created = lifecycle.create(accreditation_input()).await.expect("create");
        lifecycle.delete(created.id).await.expect("first delete");
        let err = lifecycle.delete(created.id).await.expect_err("second delete");
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert!(matches!(
            lifecycle.get(created.id).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn toggle_flips_between_active_and_paused() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let created = lifecycle.create(accreditation_input()).await.expect("create");
        let paused = lifecycle.toggle(created.id).await.expect("pause");
        assert_eq!(paused.status, CertificateStatus::Paused);
        let active = lifecycle.toggle(created.id).await.expect("resume");
        assert_eq!(active.status, CertificateStatus::Active);

        lifecycle
            .set_status(created.id, "EXPIRED")
            .await
            .expect("expire");
        let reactivated = lifecycle.toggle(created.id).await.expect("reactivate");
        assert_eq!(reactivated.status, CertificateStatus::Active);
    }

    #[tokio::test]
    async fn set_status_validates_the_value() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let created = lifecycle.create(accreditation_input()).await.expect("create");
        let err = lifecycle
            .set_status(created.id, "ARCHIVED")
            .await
            .expect_err("invalid status");
        assert!(matches!(err, RegistryError::Validation(message) if message == "Invalid status"));

        let revoked = lifecycle
            .set_status(created.id, "REVOKED")
            .await
            .expect("revoke");
        assert_eq!(revoked.status, CertificateStatus::Revoked);

        let err = lifecycle
            .set_status(Uuid::new_v4(), "ACTIVE")
            .await
            .expect_err("unknown id");
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_clears_absent_optional_dates_and_keeps_identity() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let created = lifecycle.create(accreditation_input()).await.expect("create");
        assert!(created.initial_accreditation_date.is_some());

        let updated = lifecycle
            .update(
                created.id,
                CertificateInput {
                    organization_name: Some("Acme Labs International".into()),
                    status: Some("PAUSED".into()),
                    ..CertificateInput::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.organization_name, "Acme Labs International");
        assert_eq!(updated.status, CertificateStatus::Paused);
        assert_eq!(updated.initial_accreditation_date, None);
        assert_eq!(updated.issue_date, created.issue_date);
        assert_eq!(updated.expiration_date, created.expiration_date);
        assert_eq!(updated.scope, created.scope);
        assert_eq!(updated.certificate_number, created.certificate_number);
        assert_eq!(updated.public_slug, created.public_slug);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (_store, lifecycle) = lifecycle_with(Arc::new(NanoidIdentity::new()));
        let err = lifecycle
            .update(Uuid::new_v4(), accreditation_input())
            .await
            .expect_err("missing");
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn update_rules_for_text_fields() {
        let created = NewCertificate::from_input(accreditation_input())
            .expect("valid")
            .into_certificate("AAA-AC-2024-AAAAAA".into(), "slug".into(), Utc::now());
        let updated = apply_update(
            created.clone(),
            CertificateInput {
                scope: Some(String::new()),
                cert_type: Some("ORGANIZATIONAL_MEMBERSHIP".into()),
                ..CertificateInput::default()
            },
            Utc::now(),
        )
        .expect("apply");
        assert_eq!(updated.scope, None);
        assert_eq!(updated.accredited_as, created.accredited_as);
        assert_eq!(updated.cert_type, CertificateType::OrganizationalMembership);

        let err = apply_update(
            created,
            CertificateInput {
                address: Some(" ".into()),
                ..CertificateInput::default()
            },
            Utc::now(),
        )
        .expect_err("blank address");
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn dates_accept_plain_and_rfc3339_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        assert_eq!(parse_date("issueDate", "2024-01-15").expect("plain"), expected);
        assert_eq!(
            parse_date("issueDate", "2024-01-15T00:00:00.000Z").expect("rfc3339"),
            expected
        );
        assert!(parse_date("issueDate", "yesterday").is_err());
    }

    struct FailingStore(InMemoryStore);

    #[async_trait::async_trait]
    impl CertificateStore for FailingStore {
        async fn insert_certificate(&self, _certificate: Certificate) -> StoreResult<Certificate> {
            Err(StoreError::Unexpected(anyhow::anyhow!("disk full")))
        }
        async fn get_certificate(&self, id: Uuid) -> StoreResult<Certificate> {
            self.0.get_certificate(id).await
        }
        async fn find_certificate_by_slug(&self, slug: &str) -> StoreResult<Option<Certificate>> {
            self.0.find_certificate_by_slug(slug).await
        }
        async fn find_certificate_by_number(
            &self,
            number: &str,
        ) -> StoreResult<Option<Certificate>> {
            self.0.find_certificate_by_number(number).await
        }
        async fn update_certificate(&self, certificate: Certificate) -> StoreResult<Certificate> {
            self.0.update_certificate(certificate).await
        }
        async fn set_certificate_status(
            &self,
            id: Uuid,
            status: CertificateStatus,
            updated_at: DateTime<Utc>,
        ) -> StoreResult<Certificate> {
            self.0.set_certificate_status(id, status, updated_at).await
        }
        async fn delete_certificate(&self, id: Uuid) -> StoreResult<()> {
            self.0.delete_certificate(id).await
        }
        async fn list_certificates(
            &self,
            filter: &crate::query::CertificateFilter,
            offset: u64,
            limit: u64,
        ) -> StoreResult<Vec<Certificate>> {
            self.0.list_certificates(filter, offset, limit).await
        }
        async fn count_certificates(
            &self,
            filter: &crate::query::CertificateFilter,
        ) -> StoreResult<u64> {
            self.0.count_certificates(filter).await
        }
        async fn certificate_breakdown(&self) -> StoreResult<Vec<crate::store::BreakdownRow>> {
            self.0.certificate_breakdown().await
        }
        async fn health_check(&self) -> StoreResult<()> {
            Ok(())
        }
        fn is_durable(&self) -> bool {
            false
        }
        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    #[async_trait::async_trait]
    impl crate::store::AdminStore for FailingStore {
        async fn upsert_admin(
            &self,
            admin: crate::model::AdminUser,
        ) -> StoreResult<crate::model::AdminUser> {
            self.0.upsert_admin(admin).await
        }
        async fn find_admin_by_email(
            &self,
            email: &str,
        ) -> StoreResult<Option<crate::model::AdminUser>> {
            self.0.find_admin_by_email(email).await
        }
        async fn get_admin(&self, id: Uuid) -> StoreResult<crate::model::AdminUser> {
            self.0.get_admin(id).await
        }
    }

    #[tokio::test]
    async fn unexpected_store_errors_are_not_retried() {
        let identity = Arc::new(ScriptedIdentity::new(&["AAA-AC-2024-AAAAAA"], &["only-slug-001"]));
        let lifecycle = CertificateLifecycle::new(
            Arc::new(FailingStore(InMemoryStore::new())),
            identity.clone(),
        );
        let err = lifecycle
            .create(accreditation_input())
            .await
            .expect_err("store failure");
        assert!(matches!(err, RegistryError::Store(_)));
        assert_eq!(identity.numbers_issued(), 1);
    }
}

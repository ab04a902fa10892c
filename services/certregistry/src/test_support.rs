//! Shared fixtures for unit tests.
use crate::identity::IdentityGenerator;
use crate::model::{Certificate, CertificateStatus, CertificateType};
use chrono::{NaiveDate, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

pub(crate) fn sample_certificate(
    cert_type: CertificateType,
    organization_name: &str,
    certificate_number: &str,
) -> Certificate {
    let now = Utc::now();
    Certificate {
        id: Uuid::new_v4(),
        certificate_number: certificate_number.to_string(),
        public_slug: certificate_number.to_lowercase(),
        cert_type,
        status: CertificateStatus::Active,
        organization_name: organization_name.to_string(),
        address: "123 Quality Avenue, Springfield".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("issue date"),
        expiration_date: NaiveDate::from_ymd_opt(2027, 1, 15).expect("expiration date"),
        qualifications: None,
        membership_date: None,
        accredited_as: Some("ISO 17025:2017".to_string()),
        scope: Some("Chemical Testing Laboratory".to_string()),
        issue_no: Some("001".to_string()),
        initial_accreditation_date: None,
        created_at: now,
        updated_at: now,
    }
}

/// Replays fixed numbers and slugs in order; the last value repeats once the
/// script runs out.
pub(crate) struct ScriptedIdentity {
    numbers: Mutex<VecDeque<String>>,
    slugs: Mutex<VecDeque<String>>,
    issued: Mutex<usize>,
}

impl ScriptedIdentity {
    pub(crate) fn new(numbers: &[&str], slugs: &[&str]) -> Self {
        Self {
            numbers: Mutex::new(numbers.iter().map(|s| s.to_string()).collect()),
            slugs: Mutex::new(slugs.iter().map(|s| s.to_string()).collect()),
            issued: Mutex::new(0),
        }
    }

    pub(crate) fn numbers_issued(&self) -> usize {
        *self.issued.lock().expect("issued lock")
    }

    fn next(queue: &Mutex<VecDeque<String>>) -> String {
        let mut queue = queue.lock().expect("script lock");
        if queue.len() > 1 {
            queue.pop_front().expect("scripted value")
        } else {
            queue.front().cloned().expect("scripted value")
        }
    }
}

impl IdentityGenerator for ScriptedIdentity {
    fn certificate_number(&self, _cert_type: CertificateType, _year: i32) -> String {
        *self.issued.lock().expect("issued lock") += 1;
        Self::next(&self.numbers)
    }

    fn public_slug(&self) -> String {
        Self::next(&self.slugs)
    }
}

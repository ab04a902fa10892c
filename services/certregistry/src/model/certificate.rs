//! Certificate entity and its closed enums.
//!
//! # Purpose
//! Defines the single business entity of the registry along with the type and
//! status enums that drive template selection and public visibility.
//!
//! # Key invariants
//! - `certificate_number` and `public_slug` are assigned once and never change.
//! - Wire names of the enums are SCREAMING_SNAKE_CASE and double as the
//!   storage representation.
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateType {
    IndividualMembership,
    Accreditation,
    OrganizationalMembership,
}

impl CertificateType {
    pub const ALL: [CertificateType; 3] = [
        CertificateType::IndividualMembership,
        CertificateType::Accreditation,
        CertificateType::OrganizationalMembership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::IndividualMembership => "INDIVIDUAL_MEMBERSHIP",
            CertificateType::Accreditation => "ACCREDITATION",
            CertificateType::OrganizationalMembership => "ORGANIZATIONAL_MEMBERSHIP",
        }
    }

    /// Two-letter segment embedded in certificate numbers.
    pub fn prefix(&self) -> &'static str {
        match self {
            CertificateType::IndividualMembership => "IM",
            CertificateType::Accreditation => "AC",
            CertificateType::OrganizationalMembership => "OM",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CertificateType::IndividualMembership => "Individual Membership",
            CertificateType::Accreditation => "Accreditation",
            CertificateType::OrganizationalMembership => "Organizational Membership",
        }
    }

    /// Nominal validity in years. Informational only; expiration dates are
    /// whatever the admin submits.
    pub fn default_validity_years(&self) -> u32 {
        match self {
            CertificateType::IndividualMembership => 2,
            CertificateType::Accreditation => 3,
            CertificateType::OrganizationalMembership => 1,
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INDIVIDUAL_MEMBERSHIP" => Ok(CertificateType::IndividualMembership),
            "ACCREDITATION" => Ok(CertificateType::Accreditation),
            "ORGANIZATIONAL_MEMBERSHIP" => Ok(CertificateType::OrganizationalMembership),
            _ => Err(ParseEnumError {
                kind: "certificate type",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Active,
    Paused,
    Expired,
    Revoked,
}

impl CertificateStatus {
    pub const ALL: [CertificateStatus; 4] = [
        CertificateStatus::Active,
        CertificateStatus::Paused,
        CertificateStatus::Expired,
        CertificateStatus::Revoked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Active => "ACTIVE",
            CertificateStatus::Paused => "PAUSED",
            CertificateStatus::Expired => "EXPIRED",
            CertificateStatus::Revoked => "REVOKED",
        }
    }

    /// PAUSED and REVOKED certificates never reach the public detail view.
    pub fn is_restricted(&self) -> bool {
        matches!(self, CertificateStatus::Paused | CertificateStatus::Revoked)
    }

    /// Admin quick action: ACTIVE pauses, everything else reactivates.
    pub fn toggled(&self) -> CertificateStatus {
        match self {
            CertificateStatus::Active => CertificateStatus::Paused,
            CertificateStatus::Paused | CertificateStatus::Expired | CertificateStatus::Revoked => {
                CertificateStatus::Active
            }
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(CertificateStatus::Active),
            "PAUSED" => Ok(CertificateStatus::Paused),
            "EXPIRED" => Ok(CertificateStatus::Expired),
            "REVOKED" => Ok(CertificateStatus::Revoked),
            _ => Err(ParseEnumError {
                kind: "certificate status",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub certificate_number: String,
    pub public_slug: String,
    #[serde(rename = "type")]
    pub cert_type: CertificateType,
    pub status: CertificateStatus,
    pub organization_name: String,
    pub address: String,
    pub issue_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub qualifications: Option<String>,
    pub membership_date: Option<NaiveDate>,
    pub accredited_as: Option<String>,
    pub scope: Option<String>,
    pub issue_no: Option<String>,
    pub initial_accreditation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    /// Whole calendar years between issue and expiration, as printed on the
    /// organizational template.
    pub fn validity_years(&self) -> i32 {
        self.expiration_date.year() - self.issue_date.year()
    }

    pub fn download_file_name(&self) -> String {
        format!("{}.png", self.certificate_number)
    }
}

/// Format a date the way certificates print it, e.g. "January 15, 2024".
pub fn format_certificate_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Issue date plus the type's nominal validity. Feb 29 clamps to Feb 28.
pub fn default_expiration(cert_type: CertificateType, issue_date: NaiveDate) -> NaiveDate {
    let months = Months::new(cert_type.default_validity_years() * 12);
    issue_date.checked_add_months(months).unwrap_or(NaiveDate::MAX)
}

//! Certificate registry data model.
//!
//! # Purpose
//! Re-exports the certificate entity, its closed type/status enums, and the
//! admin user record shared by the store, lifecycle, and HTTP layers.
mod admin;
mod certificate;

pub use admin::{AdminRole, AdminUser};
pub use certificate::{
    Certificate, CertificateStatus, CertificateType, ParseEnumError, default_expiration,
    format_certificate_date,
};

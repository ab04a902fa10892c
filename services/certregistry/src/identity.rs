//! Certificate identity generation.
//!
//! # Purpose
//! Produces the two identifiers assigned at creation time: the human-readable
//! certificate number (`AAA-{prefix}-{year}-{6 chars}`) and the opaque public
//! slug used in share links.
//!
//! # Notes
//! The random byte source is injectable so the create retry path can be driven
//! deterministically in tests. Uniqueness is enforced by the store, not here.
use crate::model::CertificateType;

pub const NUMBER_ISSUER: &str = "AAA";
pub const NUMBER_SUFFIX_LEN: usize = 6;
pub const SLUG_LEN: usize = 12;

pub const NUMBER_ALPHABET: [char; 36] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

pub const SLUG_ALPHABET: [char; 64] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l',
    'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9', '_', '-',
];

/// Source of certificate numbers and public slugs.
pub trait IdentityGenerator: Send + Sync {
    fn certificate_number(&self, cert_type: CertificateType, year: i32) -> String;
    fn public_slug(&self) -> String;
}

/// Nanoid-backed generator; `random` returns `n` random bytes.
#[derive(Clone, Copy)]
pub struct NanoidIdentity {
    random: fn(usize) -> Vec<u8>,
}

impl NanoidIdentity {
    pub fn new() -> Self {
        Self::with_random(nanoid::rngs::default)
    }

    pub fn with_random(random: fn(usize) -> Vec<u8>) -> Self {
        Self { random }
    }
}

impl Default for NanoidIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityGenerator for NanoidIdentity {
    fn certificate_number(&self, cert_type: CertificateType, year: i32) -> String {
        let suffix = nanoid::format(self.random, &NUMBER_ALPHABET, NUMBER_SUFFIX_LEN);
        format!("{NUMBER_ISSUER}-{}-{year}-{suffix}", cert_type.prefix())
    }

    fn public_slug(&self) -> String {
        nanoid::format(self.random, &SLUG_ALPHABET, SLUG_LEN)
    }
}

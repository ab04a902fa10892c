//! Certificate registry service library crate.
//!
//! # Purpose
//! Exposes certificate issuance, lifecycle, listing, template rendering, and
//! public verification, plus the HTTP API, configuration, and storage
//! backends used by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod qr;
pub mod query;
pub mod render;
pub mod seed;
pub mod store;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

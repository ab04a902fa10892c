//! Domain error taxonomy shared by the lifecycle, query, and verification
//! layers.
//!
//! # Purpose
//! Collapses store failures into the categories the HTTP layer renders:
//! validation (400), not found (404), conflict (409) and internal (500).
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn validation(message: impl Into<String>) -> Self {
        RegistryError::Validation(message.into())
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => RegistryError::NotFound(what),
            StoreError::Conflict(what) => RegistryError::Conflict(what),
            other => RegistryError::Store(other),
        }
    }
}

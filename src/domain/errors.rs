//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! Every message is meant to be shown to a librarian as-is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Referenced asset, user or loan does not exist
    #[error("{0}")]
    NotFound(String),
    /// Required configuration (user-code prefix) is missing
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Underlying storage read/write failed
    #[error("Storage error: {0}")]
    Persistence(String),
    /// Network or spreadsheet API failure during sync
    #[error("Sync failed: {0}")]
    SyncTransport(String),
    /// Borrow would exceed the copies of an asset (only with the copy limit enabled)
    #[error("{0}")]
    OverCommitted(String),
    /// Malformed input from the caller
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn asset_not_found(id: &str) -> Self {
        DomainError::NotFound(format!("Asset with id {} not found", id))
    }

    pub fn user_not_found(id: &str) -> Self {
        DomainError::NotFound(format!("User with id {} not found", id))
    }

    pub fn loan_not_found(id: &str) -> Self {
        DomainError::NotFound(format!("Loan with id {} not found", id))
    }
}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Persistence(format!("Stored data could not be decoded: {}", e))
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        DomainError::SyncTransport(e.to_string())
    }
}

//! Storage trait definitions
//!
//! The whole persisted state is a handful of named JSON documents, so the
//! contract is a plain key-value store. Implementations live in the
//! infrastructure layer.

use async_trait::async_trait;

use super::DomainError;

/// The independently persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Assets,
    Users,
    ActiveLoans,
    LoanHistory,
    UserChanges,
    AssetChanges,
    LoanChanges,
}

impl Collection {
    /// Storage key of the collection
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Assets => "libraryAssets",
            Collection::Users => "libraryUsers",
            Collection::ActiveLoans => "libraryActiveLoans",
            Collection::LoanHistory => "libraryCompletedHistory",
            Collection::UserChanges => "libraryUserChanges",
            Collection::AssetChanges => "libraryAssetChanges",
            Collection::LoanChanges => "libraryLoanChanges",
        }
    }
}

/// Backend for the persisted collections.
///
/// `write` replaces the stored document in one step; `write_many` must apply
/// all entries or none of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw document stored under `collection`, `None` if never written
    async fn read(&self, collection: Collection) -> Result<Option<String>, DomainError>;

    /// Overwrite the document stored under `collection`
    async fn write(&self, collection: Collection, value: String) -> Result<(), DomainError>;

    /// Overwrite several documents as one unit
    async fn write_many(&self, entries: Vec<(Collection, String)>) -> Result<(), DomainError>;
}

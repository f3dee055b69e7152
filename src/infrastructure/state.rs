//! Application state containing the repository and shared resources

use std::sync::Arc;

use crate::domain::{DomainError, KeyValueStore};
use crate::infrastructure::LibraryRepository;
use crate::infrastructure::config::{Config, LibraryConfig};
use crate::services::LoanPolicy;
use crate::sync::SyncReconciler;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: LibraryRepository,
    /// Loaded once at startup
    pub library_config: Arc<LibraryConfig>,
    pub loan_policy: LoanPolicy,
    pub sync: SyncReconciler,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: &Config,
        library_config: LibraryConfig,
    ) -> Result<Self, DomainError> {
        let repo = LibraryRepository::new(store);
        let sync =
            SyncReconciler::from_config(repo.clone(), config.sheets.clone(), config.clear_policy)?;

        Ok(Self {
            repo,
            library_config: Arc::new(library_config),
            loan_policy: LoanPolicy {
                enforce_copy_limit: config.enforce_copy_limit,
            },
            sync,
        })
    }
}

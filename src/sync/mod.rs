//! Spreadsheet synchronisation
//!
//! The spreadsheet is the shared copy of the catalog; the local store is
//! the working copy and its change logs are the outbox.

pub mod mapping;
pub mod reconciler;
pub mod spreadsheet;

pub use reconciler::{SyncDirection, SyncDomain, SyncReconciler, SyncReport, SyncStatus};
pub use spreadsheet::{SheetData, SheetRow, SpreadsheetClient};

//! Services Layer
//!
//! Business logic over the repository, callable without HTTP.
//! Every mutating operation writes its collections and its change record
//! as one batch.

pub mod asset_service;
pub mod change_tracker;
pub mod loan_service;
pub mod search;
pub mod user_service;

// Re-export for convenience
pub use asset_service::DeletedAsset;
pub use change_tracker::ChangeTracker;
pub use loan_service::{Availability, LoanPolicy, RepairReport, ReturnedLoan};
pub use search::{AssetFilter, HistoryFilter, UserFilter};

pub mod asset;
pub mod change;
pub mod kv_entry;
pub mod loan;
pub mod user;

pub use asset::{Asset, AssetForm};
pub use change::{
    AssetChange, AssetSnapshot, ChangeRecord, ChangeType, LoanChange, LoanSnapshot, UserChange,
    UserSnapshot,
};
pub use loan::{ActiveLoan, LoanHistoryRecord};
pub use user::{NewUser, User, UserPatch, UserType};

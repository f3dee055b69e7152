//! Change records: the append-only outbox of local edits waiting to be
//! pushed to the spreadsheet.
//!
//! A record is immutable once appended except for its `synced` flag.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::loan::{ActiveLoan, LoanHistoryRecord};
use super::user::User;
use crate::domain::Collection;
use crate::utils::now_iso;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "CREATE",
            ChangeType::Update => "UPDATE",
            ChangeType::Delete => "DELETE",
        }
    }
}

/// Field-level snapshot of an entity as captured in a change record.
pub trait Snapshot: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Change log this snapshot type lives in
    const LOG: Collection;
    /// Entity name for logs and messages
    const ENTITY: &'static str;
}

/// Marker for snapshots whose log accepts UPDATE records.
/// Loan logs only ever hold CREATE and DELETE.
pub trait Updatable: Snapshot {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound = "S: Snapshot")]
pub struct ChangeRecord<S> {
    pub id: String,
    pub change_type: ChangeType,
    pub entity_id: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_data: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_data: Option<S>,
    #[serde(default)]
    pub synced: bool,
}

impl<S> ChangeRecord<S> {
    /// Fresh unsynced record stamped with the current time
    pub fn new(
        change_type: ChangeType,
        entity_id: &str,
        old_data: Option<S>,
        new_data: Option<S>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            change_type,
            entity_id: entity_id.to_string(),
            timestamp: now_iso(),
            old_data,
            new_data,
            synced: false,
        }
    }
}

pub type UserChange = ChangeRecord<UserSnapshot>;
pub type AssetChange = ChangeRecord<AssetSnapshot>;
pub type LoanChange = ChangeRecord<LoanSnapshot>;

/// Sync-relevant user fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub user_code: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    pub grade: Option<String>,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            user_code: Some(user.user_code.clone()),
            name: Some(user.name.clone()),
            last_name: Some(user.last_name.clone()),
            user_type: Some(user.user_type.as_str().to_string()),
            grade: user.grade.clone(),
        }
    }
}

impl Snapshot for UserSnapshot {
    const LOG: Collection = Collection::UserChanges;
    const ENTITY: &'static str = "user";
}

impl Updatable for UserSnapshot {}

/// Sync-relevant asset fields; counts are kept as the strings the sheet stores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub registration_number: Option<String>,
    pub signature: Option<String>,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_place: Option<String>,
    pub edition: Option<String>,
    pub publication_year: Option<String>,
    pub collection_title: Option<String>,
    pub collection_number: Option<String>,
    pub volumes: Option<String>,
    pub copies: Option<String>,
    pub is_loanable: Option<bool>,
    pub subjects: Option<Vec<String>>,
    pub ibic_subjects: Option<Vec<String>>,
}

impl From<&Asset> for AssetSnapshot {
    fn from(asset: &Asset) -> Self {
        Self {
            title: Some(asset.title.clone()),
            asset_type: Some(asset.asset_type.clone()),
            description: Some(asset.description.clone()),
            registration_number: asset.registration_number.clone(),
            signature: asset.signature.clone(),
            isbn: asset.isbn.clone(),
            author: asset.author.clone(),
            publisher: asset.publisher.clone(),
            publication_place: asset.publication_place.clone(),
            edition: asset.edition.clone(),
            publication_year: asset.publication_year.clone(),
            collection_title: asset.collection_title.clone(),
            collection_number: asset.collection_number.clone(),
            volumes: Some(asset.volumes.max(1).to_string()),
            copies: Some(asset.copies.max(1).to_string()),
            is_loanable: Some(asset.is_loanable),
            subjects: Some(asset.subjects.clone()),
            ibic_subjects: Some(asset.ibic_subjects.clone()),
        }
    }
}

impl Snapshot for AssetSnapshot {
    const LOG: Collection = Collection::AssetChanges;
    const ENTITY: &'static str = "asset";
}

impl Updatable for AssetSnapshot {}

/// Loan fields; `return_date` is only set on the record that closes a loan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSnapshot {
    pub asset_id: String,
    pub asset_title: String,
    pub user_id: String,
    pub user_name: String,
    pub borrow_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
}

impl From<&ActiveLoan> for LoanSnapshot {
    fn from(loan: &ActiveLoan) -> Self {
        Self {
            asset_id: loan.asset_id.clone(),
            asset_title: loan.asset_title.clone(),
            user_id: loan.user_id.clone(),
            user_name: loan.user_name.clone(),
            borrow_date: loan.borrow_date.clone(),
            return_date: None,
        }
    }
}

impl From<&LoanHistoryRecord> for LoanSnapshot {
    fn from(record: &LoanHistoryRecord) -> Self {
        Self {
            asset_id: record.asset_id.clone(),
            asset_title: record.asset_title.clone(),
            user_id: record.user_id.clone(),
            user_name: record.user_name.clone(),
            borrow_date: record.borrow_date.clone(),
            return_date: Some(record.return_date.clone()),
        }
    }
}

impl Snapshot for LoanSnapshot {
    const LOG: Collection = Collection::LoanChanges;
    const ENTITY: &'static str = "loan";
}

//! Typed access to the persisted collections
//!
//! Each collection is one JSON array. Reads of a never-written collection
//! yield an empty vector; writes replace the whole array.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::domain::{Collection, DomainError, KeyValueStore};
use crate::models::{
    ActiveLoan, Asset, AssetChange, LoanChange, LoanHistoryRecord, User, UserChange,
};

#[derive(Clone)]
pub struct LibraryRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LibraryRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, DomainError> {
        match self.store.read(collection).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn save<T: Serialize>(
        &self,
        collection: Collection,
        items: &[T],
    ) -> Result<(), DomainError> {
        let raw = serde_json::to_string(items)?;
        self.store.write(collection, raw).await
    }

    /// Persist several collections as one unit
    pub async fn save_batch(&self, batch: SaveBatch) -> Result<(), DomainError> {
        if batch.entries.is_empty() {
            return Ok(());
        }
        self.store.write_many(batch.entries).await
    }

    pub async fn get_assets(&self) -> Result<Vec<Asset>, DomainError> {
        self.load(Collection::Assets).await
    }

    pub async fn save_assets(&self, assets: &[Asset]) -> Result<(), DomainError> {
        self.save(Collection::Assets, assets).await
    }

    pub async fn get_users(&self) -> Result<Vec<User>, DomainError> {
        self.load(Collection::Users).await
    }

    pub async fn save_users(&self, users: &[User]) -> Result<(), DomainError> {
        self.save(Collection::Users, users).await
    }

    pub async fn get_active_loans(&self) -> Result<Vec<ActiveLoan>, DomainError> {
        self.load(Collection::ActiveLoans).await
    }

    pub async fn save_active_loans(&self, loans: &[ActiveLoan]) -> Result<(), DomainError> {
        self.save(Collection::ActiveLoans, loans).await
    }

    pub async fn get_completed_loan_history(&self) -> Result<Vec<LoanHistoryRecord>, DomainError> {
        self.load(Collection::LoanHistory).await
    }

    pub async fn save_completed_loan_history(
        &self,
        history: &[LoanHistoryRecord],
    ) -> Result<(), DomainError> {
        self.save(Collection::LoanHistory, history).await
    }

    pub async fn get_user_changes(&self) -> Result<Vec<UserChange>, DomainError> {
        self.load(Collection::UserChanges).await
    }

    pub async fn save_user_changes(&self, changes: &[UserChange]) -> Result<(), DomainError> {
        self.save(Collection::UserChanges, changes).await
    }

    pub async fn get_asset_changes(&self) -> Result<Vec<AssetChange>, DomainError> {
        self.load(Collection::AssetChanges).await
    }

    pub async fn save_asset_changes(&self, changes: &[AssetChange]) -> Result<(), DomainError> {
        self.save(Collection::AssetChanges, changes).await
    }

    pub async fn get_loan_changes(&self) -> Result<Vec<LoanChange>, DomainError> {
        self.load(Collection::LoanChanges).await
    }

    pub async fn save_loan_changes(&self, changes: &[LoanChange]) -> Result<(), DomainError> {
        self.save(Collection::LoanChanges, changes).await
    }
}

/// Collections to be written together through `save_batch`
#[derive(Default)]
pub struct SaveBatch {
    entries: Vec<(Collection, String)>,
}

impl SaveBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Serialize>(
        mut self,
        collection: Collection,
        items: &[T],
    ) -> Result<Self, DomainError> {
        self.entries
            .push((collection, serde_json::to_string(items)?));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryKeyValueStore;
    use crate::models::{AssetSnapshot, ChangeType, LoanSnapshot, UserSnapshot, UserType};

    fn repo() -> LibraryRepository {
        LibraryRepository::new(Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn absent_collections_read_as_empty() {
        let repo = repo();
        assert!(repo.get_assets().await.unwrap().is_empty());
        assert!(repo.get_loan_changes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collections_round_trip() {
        let repo = repo();

        let mut asset = Asset::blank("a-1".into());
        asset.title = "Cien años de soledad".into();
        asset.subjects = vec!["Novela".into()];
        repo.save_assets(&[asset.clone()]).await.unwrap();
        assert_eq!(repo.get_assets().await.unwrap(), vec![asset]);

        let user = User {
            id: "u-1".into(),
            user_code: "LIB-0001".into(),
            name: "Ana".into(),
            last_name: "Ruiz".into(),
            user_type: UserType::Teacher,
            grade: None,
        };
        repo.save_users(&[user.clone()]).await.unwrap();
        assert_eq!(repo.get_users().await.unwrap(), vec![user]);

        let loan = ActiveLoan {
            id: "l-1".into(),
            asset_id: "a-1".into(),
            asset_title: "Cien años de soledad".into(),
            user_id: "u-1".into(),
            user_name: "Ruiz, Ana".into(),
            borrow_date: "2024-05-01T10:00:00.000Z".into(),
        };
        repo.save_active_loans(&[loan.clone()]).await.unwrap();
        assert_eq!(repo.get_active_loans().await.unwrap(), vec![loan.clone()]);

        let record = loan.clone().close("2024-05-08T10:00:00.000Z".into());
        repo.save_completed_loan_history(&[record.clone()])
            .await
            .unwrap();
        assert_eq!(
            repo.get_completed_loan_history().await.unwrap(),
            vec![record]
        );

        let change = UserChange {
            id: "c-1".into(),
            change_type: ChangeType::Create,
            entity_id: "u-1".into(),
            timestamp: "2024-05-01T10:00:00.000Z".into(),
            old_data: None,
            new_data: Some(UserSnapshot::default()),
            synced: false,
        };
        repo.save_user_changes(&[change.clone()]).await.unwrap();
        assert_eq!(repo.get_user_changes().await.unwrap(), vec![change]);

        let asset_change = AssetChange {
            id: "c-2".into(),
            change_type: ChangeType::Update,
            entity_id: "a-1".into(),
            timestamp: "2024-05-01T11:00:00.000Z".into(),
            old_data: Some(AssetSnapshot::default()),
            new_data: Some(AssetSnapshot {
                copies: Some("2".into()),
                ..Default::default()
            }),
            synced: true,
        };
        repo.save_asset_changes(&[asset_change.clone()])
            .await
            .unwrap();
        assert_eq!(repo.get_asset_changes().await.unwrap(), vec![asset_change]);

        let loan_change = LoanChange {
            id: "c-3".into(),
            change_type: ChangeType::Create,
            entity_id: "l-1".into(),
            timestamp: "2024-05-01T12:00:00.000Z".into(),
            old_data: None,
            new_data: Some(LoanSnapshot::from(&loan)),
            synced: false,
        };
        repo.save_loan_changes(&[loan_change.clone()]).await.unwrap();
        assert_eq!(repo.get_loan_changes().await.unwrap(), vec![loan_change]);
    }

    #[tokio::test]
    async fn corrupt_document_is_a_persistence_error() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store
            .write(Collection::Users, "{not json".into())
            .await
            .unwrap();
        let repo = LibraryRepository::new(store);
        assert!(matches!(
            repo.get_users().await,
            Err(DomainError::Persistence(_))
        ));
    }
}

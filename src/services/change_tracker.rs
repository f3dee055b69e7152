//! Change Tracker - append-only outbox of user/asset/loan edits
//!
//! One tracker per snapshot type; each reads and rewrites its whole log.

use std::collections::HashSet;
use std::marker::PhantomData;

use crate::domain::DomainError;
use crate::infrastructure::LibraryRepository;
use crate::models::change::{ChangeRecord, ChangeType, Snapshot, Updatable};

pub struct ChangeTracker<'a, S> {
    repo: &'a LibraryRepository,
    _snapshot: PhantomData<S>,
}

impl<'a, S: Snapshot> ChangeTracker<'a, S> {
    pub fn new(repo: &'a LibraryRepository) -> Self {
        Self {
            repo,
            _snapshot: PhantomData,
        }
    }

    /// Full log in insertion order
    pub async fn all(&self) -> Result<Vec<ChangeRecord<S>>, DomainError> {
        self.repo.load(S::LOG).await
    }

    /// Unsynced records in insertion order
    pub async fn pending(&self) -> Result<Vec<ChangeRecord<S>>, DomainError> {
        let mut changes = self.all().await?;
        changes.retain(|c| !c.synced);
        Ok(changes)
    }

    /// Log with `change` appended, not yet persisted
    pub async fn staged(&self, change: ChangeRecord<S>) -> Result<Vec<ChangeRecord<S>>, DomainError> {
        let mut changes = self.all().await?;
        tracing::debug!(
            "Tracking {} of {} {}",
            change.change_type.as_str(),
            S::ENTITY,
            change.entity_id
        );
        changes.push(change);
        Ok(changes)
    }

    pub async fn append(&self, change: ChangeRecord<S>) -> Result<(), DomainError> {
        let changes = self.staged(change).await?;
        self.repo.save(S::LOG, &changes).await
    }

    /// Flag the given records as synced; unknown ids are ignored.
    pub async fn mark_synced(&self, ids: &[String]) -> Result<(), DomainError> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut changes = self.all().await?;
        for change in changes.iter_mut() {
            if ids.contains(change.id.as_str()) {
                change.synced = true;
            }
        }
        self.repo.save(S::LOG, &changes).await
    }

    /// Drop the whole log, synced or not
    pub async fn clear(&self) -> Result<(), DomainError> {
        tracing::info!("Clearing {} change log", S::ENTITY);
        self.repo.save::<ChangeRecord<S>>(S::LOG, &[]).await
    }

    pub async fn stage_create(
        &self,
        entity_id: &str,
        new_data: S,
    ) -> Result<Vec<ChangeRecord<S>>, DomainError> {
        self.staged(ChangeRecord::new(
            ChangeType::Create,
            entity_id,
            None,
            Some(new_data),
        ))
        .await
    }

    pub async fn stage_delete(
        &self,
        entity_id: &str,
        old_data: S,
    ) -> Result<Vec<ChangeRecord<S>>, DomainError> {
        self.staged(ChangeRecord::new(
            ChangeType::Delete,
            entity_id,
            Some(old_data),
            None,
        ))
        .await
    }
}

impl<S: Updatable> ChangeTracker<'_, S> {
    pub async fn stage_update(
        &self,
        entity_id: &str,
        old_data: S,
        new_data: S,
    ) -> Result<Vec<ChangeRecord<S>>, DomainError> {
        self.staged(ChangeRecord::new(
            ChangeType::Update,
            entity_id,
            Some(old_data),
            Some(new_data),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryKeyValueStore;
    use crate::models::{LoanSnapshot, UserSnapshot};
    use std::sync::Arc;

    fn repo() -> LibraryRepository {
        LibraryRepository::new(Arc::new(MemoryKeyValueStore::new()))
    }

    fn snapshot(name: &str) -> UserSnapshot {
        UserSnapshot {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn appends_in_order_and_unsynced() {
        let repo = repo();
        let tracker = ChangeTracker::<UserSnapshot>::new(&repo);

        let log = tracker.stage_create("u-1", snapshot("Ana")).await.unwrap();
        repo.save(UserSnapshot::LOG, &log).await.unwrap();
        let log = tracker
            .stage_update("u-1", snapshot("Ana"), snapshot("Ana María"))
            .await
            .unwrap();
        repo.save(UserSnapshot::LOG, &log).await.unwrap();
        tracker
            .append(ChangeRecord::new(
                ChangeType::Delete,
                "u-1",
                Some(snapshot("Ana María")),
                None,
            ))
            .await
            .unwrap();

        let all = tracker.all().await.unwrap();
        let kinds: Vec<ChangeType> = all.iter().map(|c| c.change_type).collect();
        assert_eq!(
            kinds,
            vec![ChangeType::Create, ChangeType::Update, ChangeType::Delete]
        );
        assert!(all.iter().all(|c| !c.synced));
        assert_eq!(tracker.pending().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mark_synced_is_idempotent() {
        let repo = repo();
        let tracker = ChangeTracker::<UserSnapshot>::new(&repo);

        for (id, name) in [("u-1", "Ana"), ("u-2", "Luis")] {
            tracker
                .append(ChangeRecord::new(ChangeType::Create, id, None, Some(snapshot(name))))
                .await
                .unwrap();
        }
        let first_id = tracker.all().await.unwrap()[0].id.clone();

        tracker.mark_synced(&[first_id.clone()]).await.unwrap();
        let once = tracker.all().await.unwrap();
        tracker.mark_synced(&[first_id]).await.unwrap();
        let twice = tracker.all().await.unwrap();

        assert_eq!(once, twice);
        assert!(once[0].synced);
        assert!(!once[1].synced);

        let pending = tracker.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].entity_id, "u-2");
    }

    #[tokio::test]
    async fn clear_drops_pending_records_too() {
        let repo = repo();
        let tracker = ChangeTracker::<LoanSnapshot>::new(&repo);
        tracker
            .append(ChangeRecord::new(
                ChangeType::Create,
                "l-1",
                None,
                Some(LoanSnapshot::default()),
            ))
            .await
            .unwrap();

        tracker.clear().await.unwrap();
        assert!(tracker.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn logs_are_independent() {
        let repo = repo();
        ChangeTracker::<UserSnapshot>::new(&repo)
            .append(ChangeRecord::new(ChangeType::Create, "u-1", None, Some(snapshot("Ana"))))
            .await
            .unwrap();

        assert!(
            ChangeTracker::<LoanSnapshot>::new(&repo)
                .all()
                .await
                .unwrap()
                .is_empty()
        );
    }
}

//! SeaORM implementation of KeyValueStore

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use crate::domain::{Collection, DomainError, KeyValueStore};
use crate::models::kv_entry::{ActiveModel, Column, Entity as KvEntity};

/// SQLite-backed store; `write_many` runs in a single transaction.
pub struct SeaOrmKeyValueStore {
    db: DatabaseConnection,
}

impl SeaOrmKeyValueStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn upsert<C: ConnectionTrait>(
    conn: &C,
    collection: Collection,
    value: String,
) -> Result<(), DomainError> {
    let entry = ActiveModel {
        key: Set(collection.key().to_string()),
        value: Set(value),
        updated_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    KvEntity::insert(entry)
        .on_conflict(
            OnConflict::column(Column::Key)
                .update_columns([Column::Value, Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(())
}

#[async_trait]
impl KeyValueStore for SeaOrmKeyValueStore {
    async fn read(&self, collection: Collection) -> Result<Option<String>, DomainError> {
        let entry = KvEntity::find_by_id(collection.key().to_string())
            .one(&self.db)
            .await?;
        Ok(entry.map(|e| e.value))
    }

    async fn write(&self, collection: Collection, value: String) -> Result<(), DomainError> {
        upsert(&self.db, collection, value).await
    }

    async fn write_many(&self, entries: Vec<(Collection, String)>) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;
        for (collection, value) in entries {
            upsert(&txn, collection, value).await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

//! In-memory KeyValueStore

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Collection, DomainError, KeyValueStore};

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: DashMap<Collection, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn read(&self, collection: Collection) -> Result<Option<String>, DomainError> {
        Ok(self.entries.get(&collection).map(|v| v.value().clone()))
    }

    async fn write(&self, collection: Collection, value: String) -> Result<(), DomainError> {
        self.entries.insert(collection, value);
        Ok(())
    }

    async fn write_many(&self, entries: Vec<(Collection, String)>) -> Result<(), DomainError> {
        for (collection, value) in entries {
            self.entries.insert(collection, value);
        }
        Ok(())
    }
}

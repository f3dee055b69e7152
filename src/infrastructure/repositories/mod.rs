//! Store implementations and the typed repository on top of them

pub mod library_repository;
pub mod memory_store;
pub mod sea_orm_store;

pub use library_repository::{LibraryRepository, SaveBatch};
pub use memory_store::MemoryKeyValueStore;
pub use sea_orm_store::SeaOrmKeyValueStore;

//! # pokedb
//!
//! A small record service over an ordered key-value store: unique id
//! allocation against a shared counter key, CRUD over a namespaced key
//! prefix, and the HTTP surface that exposes both.

pub mod allocator;
pub mod collection;
mod error;
pub mod http;
pub mod memory;

pub use collection::{CollectionStore, RecordKey};
pub use error::DbError;

pub mod prelude {
    pub use crate::allocator::IdAllocator;
    pub use crate::collection::{CollectionStore, RecordKey};
    pub use crate::error::DbError;
    pub use crate::memory::MemoryStore;
    pub use pokedb_types::key::{Key, KeySegment};
    pub use pokedb_types::storage::KvStore;
}

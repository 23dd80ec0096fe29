//! Unique id allocation for record collections.

use crate::error::DbError;
use pokedb_types::key::Key;
use pokedb_types::storage::KvStore;
use std::sync::Arc;

const COUNTER_NAMESPACE: &str = "counter";

/// Issues fresh, strictly increasing record ids for one collection.
///
/// The allocator holds no mutable state of its own: every call is a single
/// atomic increment against the collection's counter key, so allocators in
/// different tasks or processes sharing a store never hand out the same id.
pub struct IdAllocator {
    store: Arc<dyn KvStore>,
    counter_key: Vec<u8>,
}

impl IdAllocator {
    pub fn new(store: Arc<dyn KvStore>, collection: &str) -> Self {
        let counter_key = Key::new()
            .push_str(COUNTER_NAMESPACE)
            .push_str(collection)
            .encode();
        Self { store, counter_key }
    }

    /// Allocate the next id.
    ///
    /// A failed allocation leaves no observable side effect on the counter
    /// and is safe to retry; the caller must not create a record for it.
    pub async fn next(&self) -> Result<u64, DbError> {
        self.store
            .increment(&self.counter_key, 1)
            .await
            .map_err(|e| DbError::Allocation(e.to_string()))
    }
}

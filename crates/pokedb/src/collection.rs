//! CRUD over one record collection, namespaced under its key prefix.

use crate::allocator::IdAllocator;
use crate::error::DbError;
use pokedb_types::error::StorageError;
use pokedb_types::key::Key;
use pokedb_types::storage::KvStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Typed address of one record, decided by the shape of the inbound id
/// segment: all-digit segments are integer keys, anything else is kept as a
/// literal string key so legacy non-numeric ids stay reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Id(u64),
    Name(String),
}

impl RecordKey {
    pub fn parse(segment: &str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = segment.parse::<u64>() {
                return RecordKey::Id(id);
            }
        }
        RecordKey::Name(segment.to_string())
    }
}

/// One record collection over a shared [`KvStore`].
///
/// Stateless coordinator: all durable state lives in the store, under
/// `(<name>, <id>)` for records and `("counter", <name>)` for the id
/// counter.
pub struct CollectionStore {
    store: Arc<dyn KvStore>,
    name: String,
    ids: IdAllocator,
}

impl CollectionStore {
    pub fn new(store: Arc<dyn KvStore>, name: impl Into<String>) -> Self {
        let name = name.into();
        let ids = IdAllocator::new(Arc::clone(&store), &name);
        Self { store, name, ids }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn record_key(&self, key: &RecordKey) -> Vec<u8> {
        let base = Key::new().push_str(self.name.as_str());
        match key {
            RecordKey::Id(id) => base.push_int(*id),
            RecordKey::Name(name) => base.push_str(name.as_str()),
        }
        .encode()
    }

    /// Create a record from `body`, which must be a JSON object.
    ///
    /// The system-assigned id overwrites any caller-supplied `id` field.
    /// Nothing is allocated or written when the body is rejected; a failed
    /// allocation performs no write.
    pub async fn create(&self, body: Value) -> Result<Value, DbError> {
        let Value::Object(mut fields) = body else {
            return Err(DbError::InvalidBody);
        };
        let id = self.ids.next().await?;
        fields.insert("id".to_string(), json!(id));
        let record = Value::Object(fields);

        let bytes = serde_json::to_vec(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store
            .set(&self.record_key(&RecordKey::Id(id)), &bytes)
            .await?;
        Ok(record)
    }

    /// List every record in the collection, in ascending id order.
    ///
    /// Individual entries never fail the listing: values that are not JSON
    /// objects are wrapped as `{"value": ...}` so historical or foreign
    /// entries under the prefix still show up. Only a failed scan surfaces
    /// as an error.
    pub async fn list(&self) -> Result<Vec<Value>, DbError> {
        let prefix = Key::new().push_str(self.name.as_str()).encode();
        let entries = self.store.scan_prefix(&prefix).await?;
        Ok(entries
            .iter()
            .map(|(key, value)| Self::render_entry(key, value))
            .collect())
    }

    fn render_entry(key: &[u8], value: &[u8]) -> Value {
        match serde_json::from_slice::<Value>(value) {
            Ok(record @ Value::Object(_)) => record,
            Ok(other) => json!({ "value": other }),
            Err(e) => {
                warn!(key = ?key, error = %e, "tolerating non-JSON entry in listing");
                json!({ "value": String::from_utf8_lossy(value) })
            }
        }
    }

    /// Fetch one record. Absent keys and stored JSON `null` are both
    /// `NotFound`.
    pub async fn get(&self, key: &RecordKey) -> Result<Value, DbError> {
        let bytes = self
            .store
            .get(&self.record_key(key))
            .await?
            .ok_or(DbError::NotFound)?;
        let value = serde_json::from_slice::<Value>(&bytes)
            .map_err(|e| StorageError::Deserialization(e.to_string()))?;
        if value.is_null() {
            return Err(DbError::NotFound);
        }
        Ok(value)
    }

    /// Remove one record. Removing an absent record succeeds.
    pub async fn delete(&self, key: &RecordKey) -> Result<(), DbError> {
        self.store.delete(&self.record_key(key)).await?;
        Ok(())
    }
}

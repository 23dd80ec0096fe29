use async_trait::async_trait;
use pokedb_types::error::StorageError;
use pokedb_types::storage::{decode_counter, encode_counter, KvStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Simple in-memory async [`KvStore`]. Great for tests and examples.
///
/// The ordered map gives the same ascending-key scans as the durable
/// backend; the write lock makes `increment` a single atomic step.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let m = self.inner.read().await;
        Ok(m.get(key).cloned())
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut m = self.inner.write().await;
        m.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let mut m = self.inner.write().await;
        m.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let m = self.inner.read().await;
        Ok(m.range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn increment(&self, key: &[u8], delta: u64) -> Result<u64, StorageError> {
        let mut m = self.inner.write().await;
        let current = match m.get(key) {
            Some(bytes) => decode_counter(bytes)?,
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StorageError::TransactionFailed("counter overflow".to_string()))?;
        m.insert(key.to_vec(), encode_counter(next).to_vec());
        Ok(next)
    }
}

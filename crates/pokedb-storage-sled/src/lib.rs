use async_trait::async_trait;
use pokedb_types::error::StorageError;
use pokedb_types::storage::{decode_counter, encode_counter, KvStore};
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_TREE: &str = "kv";

/// Retries for the counter compare-and-swap loop. Exhausting these under a
/// write storm surfaces as `TransactionFailed`, which callers treat as a
/// retryable allocation failure.
const INCREMENT_RETRY_LIMIT: usize = 32;

/// Durable [`KvStore`] backed by sled.
pub struct SledStore {
    db: sled::Db,
    kv: sled::Tree,
    ops_since_flush: AtomicU64,
    flush_every: u64,
}

impl SledStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StorageError> {
        let db = sled::open(&path).map_err(|e| StorageError::BackendError(e.to_string()))?;
        let kv = db
            .open_tree(DEFAULT_TREE)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(Self {
            db,
            kv,
            ops_since_flush: AtomicU64::new(0),
            flush_every: 100,
        })
    }

    fn flush_all(&self) -> Result<(), StorageError> {
        self.kv
            .flush()
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(())
    }

    fn flush_if_due(&self) -> Result<(), StorageError> {
        if self.ops_since_flush.fetch_add(1, Ordering::Relaxed) + 1 >= self.flush_every {
            self.flush_all()?;
            self.ops_since_flush.store(0, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for SledStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let res = self
            .kv
            .get(key)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(res.map(|ivec| ivec.to_vec()))
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.kv
            .insert(key, value)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        self.flush_if_due()
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.kv
            .remove(key)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        self.flush_if_due()
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let mut res = Vec::new();
        for item in self.kv.scan_prefix(prefix) {
            let (k, v) = item.map_err(|e| StorageError::BackendError(e.to_string()))?;
            res.push((k.to_vec(), v.to_vec()));
        }
        Ok(res)
    }

    async fn increment(&self, key: &[u8], delta: u64) -> Result<u64, StorageError> {
        for _ in 0..INCREMENT_RETRY_LIMIT {
            let current = self
                .kv
                .get(key)
                .map_err(|e| StorageError::BackendError(e.to_string()))?;
            let next = match &current {
                Some(bytes) => decode_counter(bytes)?
                    .checked_add(delta)
                    .ok_or_else(|| {
                        StorageError::TransactionFailed("counter overflow".to_string())
                    })?,
                None => delta,
            };
            match self
                .kv
                .compare_and_swap(key, current, Some(&encode_counter(next)[..]))
                .map_err(|e| StorageError::BackendError(e.to_string()))?
            {
                Ok(()) => {
                    // Counter durability decides whether ids can repeat
                    // after a crash, so this does not ride the batched
                    // flush cadence.
                    self.flush_all()?;
                    return Ok(next);
                }
                Err(_conflict) => continue,
            }
        }
        Err(StorageError::TransactionFailed(
            "counter increment contended, retries exhausted".to_string(),
        ))
    }
}

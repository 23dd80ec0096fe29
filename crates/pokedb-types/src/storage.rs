//! Storage adapter trait for pokedb.
//!
//! This module defines the core storage abstraction that allows plugging in
//! different storage backends (sled, in-memory, ...). Keys are raw bytes;
//! callers produce them with [`crate::key::Key::encode`] so that the
//! backend's native byte order matches the composite-key order.

use crate::error::StorageError;
use async_trait::async_trait;

/// Async storage adapter port.
///
/// Implement this trait to plug in a storage backend. All mutation of shared
/// state goes through these methods; in particular [`KvStore::increment`] is
/// the only primitive collections use to derive fresh record ids, so its
/// atomicity is what makes concurrent id allocation safe.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Retrieve bytes for a key.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put bytes under `key`, replacing any existing value.
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Scan all entries whose key starts with `prefix`, in ascending
    /// byte order of the keys. The returned snapshot is finite and the
    /// scan can be re-issued at any time.
    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;

    /// Atomically add `delta` to the unsigned counter at `key` and return
    /// the post-increment value from the same atomic step. A missing key
    /// counts as zero, so the first increment of a fresh counter yields
    /// `delta`.
    ///
    /// Fails with [`StorageError::TransactionFailed`] when the backend
    /// cannot commit the increment (conflict retries exhausted); the
    /// counter is unchanged by a failed call as far as the caller can
    /// observe, so the operation is safe to retry.
    async fn increment(&self, key: &[u8], delta: u64) -> Result<u64, StorageError>;
}

/// Encode a counter value in the store's fixed-width representation.
pub fn encode_counter(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode a stored counter value. Anything other than 8 bytes means the key
/// does not hold a counter.
pub fn decode_counter(bytes: &[u8]) -> Result<u64, StorageError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        StorageError::Deserialization(format!(
            "counter value must be 8 bytes, found {}",
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::RwLock;

    struct MockStore {
        data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                data: RwLock::new(BTreeMap::new()),
            }
        }
    }

    #[async_trait]
    impl KvStore for MockStore {
        async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(self.data.read().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
            self.data
                .write()
                .unwrap()
                .insert(key.to_vec(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
            self.data.write().unwrap().remove(key);
            Ok(())
        }

        async fn scan_prefix(
            &self,
            prefix: &[u8],
        ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
            Ok(self
                .data
                .read()
                .unwrap()
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }

        async fn increment(&self, key: &[u8], delta: u64) -> Result<u64, StorageError> {
            let mut data = self.data.write().unwrap();
            let current = match data.get(key) {
                Some(bytes) => decode_counter(bytes)?,
                None => 0,
            };
            let next = current + delta;
            data.insert(key.to_vec(), encode_counter(next).to_vec());
            Ok(next)
        }
    }

    #[tokio::test]
    async fn mock_store_put_get_delete() {
        let store = MockStore::new();

        store.set(b"key1", b"value1").await.unwrap();
        let val = store.get(b"key1").await.unwrap();
        assert_eq!(val, Some(b"value1".to_vec()));

        store.delete(b"key1").await.unwrap();
        let val = store.get(b"key1").await.unwrap();
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn increment_starts_from_zero() {
        let store = MockStore::new();
        assert_eq!(store.increment(b"ctr", 1).await.unwrap(), 1);
        assert_eq!(store.increment(b"ctr", 1).await.unwrap(), 2);
        assert_eq!(store.increment(b"ctr", 5).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn increment_rejects_non_counter_value() {
        let store = MockStore::new();
        store.set(b"ctr", b"not a counter").await.unwrap();
        assert!(matches!(
            store.increment(b"ctr", 1).await,
            Err(StorageError::Deserialization(_))
        ));
    }

    #[test]
    fn counter_round_trip() {
        assert_eq!(decode_counter(&encode_counter(0)).unwrap(), 0);
        assert_eq!(decode_counter(&encode_counter(42)).unwrap(), 42);
        assert_eq!(
            decode_counter(&encode_counter(u64::MAX)).unwrap(),
            u64::MAX
        );
        assert!(decode_counter(b"short").is_err());
    }
}

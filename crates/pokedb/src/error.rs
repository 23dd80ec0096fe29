use pokedb_types::error::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid record body: expected a JSON object")]
    InvalidBody,
    #[error("Failed to allocate id: {0}")]
    Allocation(String),
    #[error("Item not found with the given ID")]
    NotFound,
}

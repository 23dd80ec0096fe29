use thiserror::Error;

/// Storage-specific errors
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum StorageError {
    #[error("Failed to access underlying store: {0}")]
    BackendError(String),

    #[error("Failed to serialize data: {0}")]
    Serialization(String),

    #[error("Failed to deserialize data: {0}")]
    Deserialization(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

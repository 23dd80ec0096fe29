//! # pokedb-types
//!
//! Core domain types shared across the pokedb crates:
//! - Composite key encoding for the ordered keyspace
//! - The storage adapter trait
//! - Error types
//!
//! This crate intentionally has minimal dependencies so that storage
//! backends and mock implementations can be built against it cheaply.

pub mod error;
pub mod key;
pub mod storage;

// Re-exports for convenience
pub use error::StorageError;
pub use key::{Key, KeySegment};
pub use storage::{decode_counter, encode_counter, KvStore};

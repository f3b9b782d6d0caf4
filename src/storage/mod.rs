//! Key-value persistence.
//!
//! Every collection (users, forms, responses) lives under a single key as a
//! JSON array, the same layout a browser's local storage would hold. The
//! [`KeyValueStore`] trait is the raw pass-through; [`Storage`] adds typed
//! collection access on top of it.

mod file;
mod memory;
mod repository;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repository::{RecordedResponse, Storage, FORMS_KEY, RESPONSES_KEY, USERS_KEY};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Raw string storage addressed by key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

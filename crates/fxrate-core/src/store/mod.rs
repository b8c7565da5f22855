//! Local persistence for the last rate snapshot and the currency pair.
//!
//! [`RateStore`] holds the domain logic (expiry stamping, lazy expiry checks,
//! preference parsing) on top of a plain string [`KeyValueStore`]. Two
//! backends ship: [`FileKeyValueStore`] for the CLI and
//! [`MemoryKeyValueStore`] for tests and mock runs.

mod file;
mod memory;
mod rate_store;

use std::path::PathBuf;

use thiserror::Error;

use crate::ValidationError;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use rate_store::{RateStore, PREFERENCE_KEY, SNAPSHOT_KEY};

/// Failures of a key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file '{path}' is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize store entry '{key}': {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot stamp an expiry on the cached snapshot: {0}")]
    Expiry(#[source] ValidationError),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Minimal string key-value storage. Single writer, last write wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

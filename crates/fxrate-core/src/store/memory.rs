use std::collections::HashMap;
use std::sync::RwLock;

use crate::store::{KeyValueStore, StoreError};

/// Process-local store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.map.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.to_owned(), value);
        Ok(())
    }
}

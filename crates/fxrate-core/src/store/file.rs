use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::store::{KeyValueStore, StoreError};

/// Key-value store persisted as one JSON object in a single file.
///
/// Every `set` rewrites the whole file through a uniquely named temp file in
/// the same directory that is then persisted over the store, so readers never
/// observe a half-written document.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data_dir>/fxrate/store.json`, or `./fxrate-store.json` when the
    /// platform has no data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("fxrate").join("store.json"))
            .unwrap_or_else(|| PathBuf::from("fxrate-store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(io_error)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let body = serde_json::to_string_pretty(map).map_err(|source| {
            StoreError::Serialization {
                key: "<document>",
                source,
            }
        })?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(io_error)?;
        temp.write_all(body.as_bytes()).map_err(io_error)?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path)
            .map_err(|error| io_error(error.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(error @ StoreError::Corrupt { .. }) => {
                tracing::warn!(%error, "discarding unreadable store file");
                BTreeMap::new()
            }
            Err(error) => return Err(error),
        };

        map.insert(key.to_owned(), value);
        self.write_map(&map)
    }
}

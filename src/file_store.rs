//! JSON-file backed [`PersistentStore`].
//!
//! The whole key space lives in one JSON object on disk. Every mutation
//! rewrites the file atomically (write to a temp file in the same
//! directory, then rename). If the write fails the in-memory map is rolled
//! back, so memory and disk never disagree.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use inkpad_core::error::StoreError;
use inkpad_core::store::PersistentStore;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::Config;

pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// A file that exists but does not hold a JSON object of strings is an
    /// error rather than being silently replaced.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(unavailable(&path, e)),
        };
        debug!(path = %path.display(), keys = entries.len(), "store opened");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| unavailable(&dir, e))?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| unavailable(&dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| unavailable(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| unavailable(&self.path, e.error))?;
        Ok(())
    }

    /// Apply `mutate` and write the result; undo it if the write fails.
    fn mutate(
        &self,
        key: &str,
        mutate: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let previous = entries.get(key).cloned();
        mutate(&mut entries);
        if let Err(e) = self.write_file(&entries) {
            match previous {
                Some(value) => entries.insert(key.to_string(), value),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", path.display(), err))
}

impl PersistentStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.mutate(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.get(key)?.is_none() {
            return Ok(());
        }
        self.mutate(key, |entries| {
            entries.remove(key);
        })
    }
}

/// Open the store configured in `[store]`.
pub fn open_store(config: &Config) -> Result<Arc<JsonFileStore>> {
    let store = JsonFileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open store: {}", config.store.path.display()))?;
    Ok(Arc::new(store))
}

//! Storage backends for the persisted snapshot.
//!
//! A backend is a flat string key/value area, the shape of browser local
//! storage. The repository writes one serialized snapshot under one key.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};

/// Durable key/value area the repository persists into.
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Read the value under `key`; `Ok(None)` when nothing has been written.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value under `key`.
    fn write(&self, key: &str, contents: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;
}

fn check_key(key: &str) -> StoreResult<()> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::invalid_key(key))
    }
}

/// One JSON file per key under a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous copy intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, contents: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend. Clones share the same map, so handing a clone to a
/// fresh repository behaves like reloading the page.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        check_key(key)?;
        let entries = self.entries.lock();
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> StoreResult<()> {
        check_key(key)?;
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        let mut entries = self.entries.lock();
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_entries() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.write("store", "{}").unwrap();
        assert_eq!(b.read("store").unwrap().as_deref(), Some("{}"));
        b.remove("store").unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn file_storage_round_trips_and_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FileStorage::new(dir.path().join("nested"));
        assert_eq!(fs.read("store").unwrap(), None);

        fs.write("store", "{\"v\":1}").unwrap();
        assert_eq!(fs.read("store").unwrap().as_deref(), Some("{\"v\":1}"));
        assert!(!fs.path_for("store").unwrap().with_extension("json.tmp").exists());

        fs.remove("store").unwrap();
        fs.remove("store").unwrap();
        assert_eq!(fs.read("store").unwrap(), None);
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let fs = FileStorage::new("/tmp");
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(fs.read(key), Err(StoreError::InvalidKey { .. })), "{key}");
        }
    }
}

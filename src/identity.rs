//! Durable storage for the anonymous user id.

use crate::Error;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::warn;

/// Key under which the anonymous user id is stored.
pub const USER_ID_KEY: &str = "ApplicationInsights.playerId";

/// Durable key/value store used to keep the anonymous user id stable across restarts.
pub trait IdentityStore: Debug + Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
}

/// Identity store that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Identity store backed by a JSON object file.
///
/// The file is created on the first write. Writes go to a sibling temporary file which is then
/// renamed over the original.
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileIdentityStore {
    /// Use the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, Error> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(Error::IdentityStoreFormat),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(Error::IdentityStoreIo(err)),
        }
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(Error::IdentityStoreIo)?;
        }
        let serialized = serde_json::to_vec_pretty(values).map_err(Error::IdentityStoreFormat)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serialized).map_err(Error::IdentityStoreIo)?;
        fs::rename(&tmp, &self.path).map_err(Error::IdentityStoreIo)
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read() {
            Ok(mut values) => values.remove(key),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read identity store");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // unreadable contents get overwritten
        let mut values = self.read().unwrap_or_default();
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("ai-identity-{}", Uuid::new_v4()))
            .join("identity.json")
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryIdentityStore::new();
        assert_eq!(None, store.get(USER_ID_KEY));
        store.set(USER_ID_KEY, "abc").unwrap();
        assert_eq!(Some("abc".to_string()), store.get(USER_ID_KEY));
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = temp_path();
        FileIdentityStore::new(&path).set(USER_ID_KEY, "abc").unwrap();
        let reopened = FileIdentityStore::new(&path);
        assert_eq!(Some("abc".to_string()), reopened.get(USER_ID_KEY));
        assert_eq!(None, reopened.get("other"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_store_keeps_other_keys() {
        let path = temp_path();
        let store = FileIdentityStore::new(&path);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(Some("1".to_string()), store.get("a"));
        assert_eq!(Some("2".to_string()), store.get("b"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not json").unwrap();
        let store = FileIdentityStore::new(&path);
        assert_eq!(None, store.get(USER_ID_KEY));
        store.set(USER_ID_KEY, "abc").unwrap();
        assert_eq!(Some("abc".to_string()), store.get(USER_ID_KEY));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}

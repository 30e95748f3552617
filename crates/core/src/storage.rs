//! Client key/value storage capability (local and session storage).
//!
//! Values are plain strings; structured values are JSON-encoded by the caller.

use dashmap::DashMap;

use crate::error::{OptimizeError, OptimizeResult};

/// Durable or session-scoped key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> OptimizeResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> OptimizeResult<()>;
    fn remove(&self, key: &str) -> OptimizeResult<()>;
}

/// In-memory storage, used for page snapshots and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted copy of every entry.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort();
        entries
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let store = MemoryStore::new();
        for (k, v) in iter {
            store.entries.insert(k.into(), v.into());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> OptimizeResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> OptimizeResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> OptimizeResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage that is switched off (private mode, blocked cookies). Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> OptimizeResult<Option<String>> {
        Err(OptimizeError::Storage("storage is unavailable".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> OptimizeResult<()> {
        Err(OptimizeError::Storage("storage is unavailable".into()))
    }

    fn remove(&self, _key: &str) -> OptimizeResult<()> {
        Err(OptimizeError::Storage("storage is unavailable".into()))
    }
}

//! Durable mapping from ticket key to its generated solutions.
//!
//! The cache itself is a plain value owned by [`crate::AppState`]. Durability
//! goes through an injected [`CacheStore`]: the whole map is encoded as one
//! JSON blob and written wholesale after every mutation.

use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

use desk_logging::{desk_debug, desk_warn};

use crate::{Solution, TicketKey};

/// Key-value capability used to persist the solution cache blob.
pub trait CacheStore {
    /// Returns the last saved blob, or `None` if nothing was ever saved.
    fn load(&self) -> Option<String>;
    /// Replaces the stored blob.
    fn save(&self, blob: &str) -> io::Result<()>;
}

/// Store that keeps the blob in memory; used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    blob: Mutex<Option<String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| io::Error::other("memory store poisoned"))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolutionCache {
    entries: BTreeMap<TicketKey, Vec<Solution>>,
}

impl SolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a persisted blob. Missing or corrupt data yields an empty cache.
    pub fn from_blob(blob: Option<&str>) -> Self {
        let Some(blob) = blob else {
            return Self::new();
        };
        match serde_json::from_str::<BTreeMap<TicketKey, Vec<Solution>>>(blob) {
            Ok(entries) => {
                desk_debug!("Restored solution cache with {} entries", entries.len());
                Self { entries }
            }
            Err(err) => {
                desk_warn!("Discarding corrupt solution cache blob: {}", err);
                Self::new()
            }
        }
    }

    pub fn restore(store: &dyn CacheStore) -> Self {
        Self::from_blob(store.load().as_deref())
    }

    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    pub fn get(&self, key: &str) -> Option<&[Solution]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replaces the entry for `key` with `solutions`. Never merges.
    pub fn put(&mut self, key: impl Into<TicketKey>, solutions: Vec<Solution>) {
        self.entries.insert(key.into(), solutions);
    }

    /// Removes the entry for `key`; returns whether one existed.
    pub fn evict(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

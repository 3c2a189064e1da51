//! Named-cache store with a JSON disk snapshot.

use super::FetchResponse;
use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

type Entries = HashMap<String, FetchResponse>;

/// Cache storage partitioned by cache name.
///
/// Mirrors the lifecycle the controller needs: named caches created on
/// first write, enumerable, and individually deletable. The whole store
/// snapshots to a single JSON file between runs.
#[derive(Default)]
pub struct CacheStorage {
    caches: Mutex<HashMap<String, Entries>>,
}

impl CacheStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entries>> {
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a response under `key` in the named cache, creating the cache
    /// if needed and overwriting any previous entry for the key.
    pub fn put(&self, cache: &str, key: &str, response: FetchResponse) {
        self.lock()
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), response);
    }

    /// Look up a response in the named cache.
    pub fn get(&self, cache: &str, key: &str) -> Option<FetchResponse> {
        self.lock().get(cache).and_then(|c| c.get(key)).cloned()
    }

    /// Names of all existing caches.
    pub fn cache_names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Delete a named cache. Returns whether it existed.
    pub fn delete(&self, cache: &str) -> bool {
        self.lock().remove(cache).is_some()
    }

    /// Delete every cache.
    pub fn delete_all(&self) {
        self.lock().clear();
    }

    /// Number of entries in a named cache.
    pub fn entry_count(&self, cache: &str) -> usize {
        self.lock().get(cache).map_or(0, HashMap::len)
    }

    /// Load a snapshot written by [`persist_to`](Self::persist_to).
    ///
    /// A missing file is not an error; the store simply starts empty.
    pub fn load_from(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read(path)?;
        let caches: HashMap<String, Entries> = serde_json::from_slice(&content)?;
        *self.lock() = caches;
        Ok(())
    }

    /// Write the whole store to a snapshot file.
    pub fn persist_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = serde_json::to_vec(&*self.lock())?;
        std::fs::write(path, snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_get_overwrites_same_key() {
        let storage = CacheStorage::new();
        storage.put("static", "/a", FetchResponse::ok("one", "text/html"));
        storage.put("static", "/a", FetchResponse::ok("two", "text/html"));

        let hit = storage.get("static", "/a").unwrap();
        assert_eq!(hit.text(), "two");
        assert_eq!(storage.entry_count("static"), 1);
    }

    #[test]
    fn test_caches_are_partitioned_by_name() {
        let storage = CacheStorage::new();
        storage.put("static", "/a", FetchResponse::ok("page", "text/html"));
        storage.put("runtime", "/a", FetchResponse::ok("data", "application/json"));

        assert_eq!(storage.get("static", "/a").unwrap().text(), "page");
        assert_eq!(storage.get("runtime", "/a").unwrap().text(), "data");
        assert!(storage.delete("static"));
        assert!(storage.get("static", "/a").is_none());
        assert_eq!(storage.get("runtime", "/a").unwrap().text(), "data");
    }

    #[test]
    fn test_delete_missing_cache_reports_false() {
        let storage = CacheStorage::new();
        assert!(!storage.delete("nope"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots").join("cache.json");

        let storage = CacheStorage::new();
        storage.put("pennybook-v1.0.0", "/index.html", FetchResponse::ok("<html>", "text/html"));
        storage.put(
            "pennybook-runtime",
            "/data/trades-index.json",
            FetchResponse::ok("{\"trades\":[]}", "application/json"),
        );
        storage.persist_to(&path).unwrap();

        let restored = CacheStorage::new();
        restored.load_from(&path).unwrap();
        assert_eq!(
            restored.get("pennybook-v1.0.0", "/index.html").unwrap().text(),
            "<html>"
        );
        assert_eq!(restored.entry_count("pennybook-runtime"), 1);
    }

    #[test]
    fn test_load_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new();
        storage.load_from(&dir.path().join("missing.json")).unwrap();
        assert!(storage.cache_names().is_empty());
    }
}

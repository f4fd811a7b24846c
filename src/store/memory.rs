//! In-memory cache store.
//!
//! Used by hosts that don't need persistence, and by tests. Every operation
//! takes the map lock, so single-key writes are all-or-nothing.

use color_eyre::{eyre::eyre, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::CacheStore;
use crate::entry::CacheEntry;

type PartitionMap = BTreeMap<String, BTreeMap<String, CacheEntry>>;

/// Non-persistent cache store holding everything in a map.
#[derive(Default)]
pub struct MemoryStore {
  partitions: Mutex<PartitionMap>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, PartitionMap>> {
    self
      .partitions
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStore for MemoryStore {
  fn open(&self, partition: &str) -> Result<()> {
    self.lock()?.entry(partition.to_string()).or_default();
    Ok(())
  }

  fn get(&self, partition: &str, key: &str) -> Result<Option<CacheEntry>> {
    Ok(
      self
        .lock()?
        .get(partition)
        .and_then(|entries| entries.get(key))
        .cloned(),
    )
  }

  fn put(&self, partition: &str, key: &str, entry: &CacheEntry) -> Result<()> {
    self
      .lock()?
      .entry(partition.to_string())
      .or_default()
      .insert(key.to_string(), entry.clone());
    Ok(())
  }

  fn delete(&self, partition: &str, key: &str) -> Result<()> {
    if let Some(entries) = self.lock()?.get_mut(partition) {
      entries.remove(key);
    }
    Ok(())
  }

  fn delete_partition(&self, partition: &str) -> Result<()> {
    self.lock()?.remove(partition);
    Ok(())
  }

  fn list_partitions(&self) -> Result<BTreeSet<String>> {
    Ok(self.lock()?.keys().cloned().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn entry(body: &[u8]) -> CacheEntry {
    CacheEntry {
      status: 200,
      headers: BTreeMap::new(),
      body: body.to_vec(),
      cached_at: Utc::now(),
    }
  }

  #[test]
  fn test_put_then_get() {
    let store = MemoryStore::new();

    store.put("images", "k", &entry(b"x")).unwrap();
    assert_eq!(store.get("images", "k").unwrap().unwrap().body, b"x");
  }

  #[test]
  fn test_partition_isolation() {
    let store = MemoryStore::new();

    store.put("images", "https://e.com/logo.png", &entry(b"x")).unwrap();

    // Same key in a different partition must not be observable
    assert!(store.get("static", "https://e.com/logo.png").unwrap().is_none());
  }

  #[test]
  fn test_delete_entry() {
    let store = MemoryStore::new();

    store.put("api", "k", &entry(b"x")).unwrap();
    store.delete("api", "k").unwrap();

    assert!(store.get("api", "k").unwrap().is_none());
  }

  #[test]
  fn test_delete_partition_drops_all_entries() {
    let store = MemoryStore::new();

    store.put("api", "k1", &entry(b"a")).unwrap();
    store.put("api", "k2", &entry(b"b")).unwrap();
    store.delete_partition("api").unwrap();

    assert!(store.get("api", "k1").unwrap().is_none());
    assert!(store.get("api", "k2").unwrap().is_none());
    assert!(store.list_partitions().unwrap().is_empty());
  }

  #[test]
  fn test_list_partitions() {
    let store = MemoryStore::new();

    store.open("a").unwrap();
    store.put("b", "k", &entry(b"x")).unwrap();

    let names = store.list_partitions().unwrap();
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
  }
}

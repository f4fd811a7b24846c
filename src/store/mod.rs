//! Partitioned cache storage backends.
//!
//! Partitions are independent namespaces: an entry lives in exactly one
//! partition and disappears with it. Single-key operations are atomic, so
//! concurrent writers to the same key never interleave partial writes.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use color_eyre::Result;
use std::collections::BTreeSet;

use crate::entry::CacheEntry;

/// Trait for partitioned key/value cache storage.
pub trait CacheStore: Send + Sync {
  /// Create the partition if it does not exist yet. Idempotent.
  fn open(&self, partition: &str) -> Result<()>;

  /// Look up an entry by key. `Ok(None)` means not found.
  fn get(&self, partition: &str, key: &str) -> Result<Option<CacheEntry>>;

  /// Write the entry for `key`, overwriting any existing one. Implicitly
  /// opens the partition. All-or-nothing.
  fn put(&self, partition: &str, key: &str, entry: &CacheEntry) -> Result<()>;

  /// Delete a single entry. No-op when absent.
  fn delete(&self, partition: &str, key: &str) -> Result<()>;

  /// Delete a partition and every entry it owns.
  fn delete_partition(&self, partition: &str) -> Result<()>;

  /// Names of all partitions currently present.
  fn list_partitions(&self) -> Result<BTreeSet<String>>;
}

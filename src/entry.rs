//! Cache entries and staleness tracking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fetch::FetchedResponse;

/// A single cached response, stamped with its write time.
///
/// Entries are owned exclusively by their partition: created on the first
/// successful network fetch, overwritten on each revalidation, and deleted
/// when the owning partition is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: Vec<u8>,
  /// When the entry was written. Staleness is always recomputed from this.
  pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
  /// Stamp a network response into an entry at `now`.
  pub fn stamp(response: &FetchedResponse, now: DateTime<Utc>) -> Self {
    Self {
      status: response.status,
      headers: response.headers.clone(),
      body: response.body.clone(),
      cached_at: now,
    }
  }

  /// Whether the entry has outlived `ttl` as of `now`.
  ///
  /// A derived verdict, never stored: an entry written at T with TTL D is
  /// fresh for reads before T+D and stale from T+D on.
  pub fn is_stale_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
    now - self.cached_at >= ttl
  }

  /// Whether the entry has outlived `ttl` right now.
  pub fn is_stale(&self, ttl: Duration) -> bool {
    self.is_stale_at(ttl, Utc::now())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry_at(cached_at: DateTime<Utc>) -> CacheEntry {
    CacheEntry {
      status: 200,
      headers: BTreeMap::new(),
      body: b"payload".to_vec(),
      cached_at,
    }
  }

  #[test]
  fn test_fresh_before_ttl_elapses() {
    let written = Utc::now();
    let entry = entry_at(written);
    let ttl = Duration::seconds(300);

    assert!(!entry.is_stale_at(ttl, written));
    assert!(!entry.is_stale_at(ttl, written + Duration::seconds(299)));
  }

  #[test]
  fn test_stale_from_ttl_boundary_on() {
    let written = Utc::now();
    let entry = entry_at(written);
    let ttl = Duration::seconds(300);

    assert!(entry.is_stale_at(ttl, written + Duration::seconds(300)));
    assert!(entry.is_stale_at(ttl, written + Duration::days(1)));
  }

  #[test]
  fn test_stamp_records_response_and_time() {
    let response = FetchedResponse {
      status: 200,
      headers: BTreeMap::from([("content-type".to_string(), "text/plain".to_string())]),
      body: b"hello".to_vec(),
    };
    let now = Utc::now();

    let entry = CacheEntry::stamp(&response, now);
    assert_eq!(entry.status, 200);
    assert_eq!(entry.body, b"hello");
    assert_eq!(entry.cached_at, now);
    assert_eq!(
      entry.headers.get("content-type").map(String::as_str),
      Some("text/plain")
    );
  }
}

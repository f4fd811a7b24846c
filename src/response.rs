//! Responses returned to the host, tagged with where they came from.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::entry::CacheEntry;
use crate::fetch::FetchedResponse;

/// Indicates where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  /// Fresh data from the network
  Network,
  /// Data from the cache, still within its partition TTL
  CacheFresh,
  /// Data from the cache past its TTL, served while revalidating
  CacheStale,
  /// Network unavailable, serving whatever the cache had as degraded service
  Offline,
}

/// The response handed back to the host application.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: Vec<u8>,
  /// Where the data came from
  pub source: ResponseSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl CachedResponse {
  /// Build a response from fresh network data.
  pub fn from_network(response: FetchedResponse) -> Self {
    Self {
      status: response.status,
      headers: response.headers,
      body: response.body,
      source: ResponseSource::Network,
      cached_at: None,
    }
  }

  /// Build a response from a cached entry.
  pub fn from_cache(entry: CacheEntry, is_stale: bool) -> Self {
    let source = if is_stale {
      ResponseSource::CacheStale
    } else {
      ResponseSource::CacheFresh
    };

    Self {
      status: entry.status,
      headers: entry.headers,
      body: entry.body,
      source,
      cached_at: Some(entry.cached_at),
    }
  }

  /// Build a degraded response from a cached entry after the network failed.
  pub fn offline(entry: CacheEntry) -> Self {
    Self {
      status: entry.status,
      headers: entry.headers,
      body: entry.body,
      source: ResponseSource::Offline,
      cached_at: Some(entry.cached_at),
    }
  }
}

//! Per-request serving algorithms over the store and entry metadata.
//!
//! Each request runs a small state machine, `START -> {CACHE_LOOKUP |
//! NETWORK_FETCH} -> RESOLVED | FAILED`, with the partition's policy
//! deciding which side goes first. Only cacheable responses (successful
//! status on a routed GET) are ever written back. A non-success origin
//! answer counts as a network failure: it falls back to any cached entry,
//! and with none it propagates as an error rather than reaching the host.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PartitionSpec, Policy};
use crate::entry::CacheEntry;
use crate::fetch::{FetchedResponse, NetworkFetch};
use crate::request::RequestDescriptor;
use crate::response::CachedResponse;
use crate::revalidate::Revalidator;
use crate::store::CacheStore;

/// Executes the serving policy selected for a request.
pub struct PolicyExecutor<S: CacheStore> {
  store: Arc<S>,
  fetcher: Arc<dyn NetworkFetch>,
  revalidator: Revalidator,
  /// Time budget for a synchronous network fetch; exceeding it counts as a
  /// network failure, not a fatal error
  fetch_timeout: Duration,
}

impl<S: CacheStore + 'static> PolicyExecutor<S> {
  pub fn new(
    store: Arc<S>,
    fetcher: Arc<dyn NetworkFetch>,
    revalidator: Revalidator,
    fetch_timeout: Duration,
  ) -> Self {
    Self {
      store,
      fetcher,
      revalidator,
      fetch_timeout,
    }
  }

  /// Run the partition's serving algorithm for one request.
  pub async fn execute(
    &self,
    spec: &PartitionSpec,
    request: &RequestDescriptor,
  ) -> Result<CachedResponse> {
    match spec.policy {
      Policy::CacheFirst => self.cache_first(spec, request).await,
      Policy::NetworkFirst => self.network_first(spec, request).await,
      Policy::StaleWhileRevalidate => self.stale_while_revalidate(spec, request).await,
    }
  }

  /// Straight to network, no store reads or writes. Used for bypassed
  /// requests.
  pub async fn pass_through(&self, request: &RequestDescriptor) -> Result<CachedResponse> {
    let response = self.fetch_with_timeout(request).await?;
    Ok(CachedResponse::from_network(response))
  }

  /// Cache-first: a fresh hit returns immediately and still triggers a
  /// background refresh, keeping the entry current without blocking the
  /// caller. A miss or stale hit goes to network synchronously, falling
  /// back to the stale entry when the network fails.
  async fn cache_first(
    &self,
    spec: &PartitionSpec,
    request: &RequestDescriptor,
  ) -> Result<CachedResponse> {
    let key = request.canonical_url();
    let cached = self.lookup(&spec.name, &key);

    if let Some(entry) = &cached {
      if !entry.is_stale(spec.ttl()) {
        self.schedule_revalidation(spec, request);
        return Ok(CachedResponse::from_cache(entry.clone(), false));
      }
    }

    match self.fetch_with_timeout(request).await {
      Ok(response) if response.is_success() => {
        self.write_back(&spec.name, &key, &response);
        Ok(CachedResponse::from_network(response))
      }
      Ok(response) => match cached {
        // Prefer the stale copy over a non-success origin answer
        Some(entry) => Ok(CachedResponse::offline(entry)),
        None => Err(eyre!(
          "Origin returned status {} for {}",
          response.status,
          request.url
        )),
      },
      Err(err) => match cached {
        Some(entry) => {
          tracing::info!(key = %key, error = %err, "Network failed, serving stale entry");
          Ok(CachedResponse::offline(entry))
        }
        None => Err(err),
      },
    }
  }

  /// Network-first: try the network within the time budget; on any failure
  /// fall back to whatever the cache holds, regardless of staleness.
  async fn network_first(
    &self,
    spec: &PartitionSpec,
    request: &RequestDescriptor,
  ) -> Result<CachedResponse> {
    let key = request.canonical_url();

    match self.fetch_with_timeout(request).await {
      Ok(response) if response.is_success() => {
        self.write_back(&spec.name, &key, &response);
        Ok(CachedResponse::from_network(response))
      }
      Ok(response) => match self.lookup(&spec.name, &key) {
        Some(entry) => Ok(CachedResponse::offline(entry)),
        // A non-success answer with no fallback is a network failure
        None => Err(eyre!(
          "Origin returned status {} for {}",
          response.status,
          request.url
        )),
      },
      Err(err) => match self.lookup(&spec.name, &key) {
        Some(entry) => {
          tracing::info!(key = %key, error = %err, "Network failed, serving cached entry");
          Ok(CachedResponse::offline(entry))
        }
        None => Err(err),
      },
    }
  }

  /// Stale-while-revalidate: any cached copy is returned immediately, with
  /// an unconditional background refresh; staleness never blocks. Only a
  /// miss goes to network synchronously.
  async fn stale_while_revalidate(
    &self,
    spec: &PartitionSpec,
    request: &RequestDescriptor,
  ) -> Result<CachedResponse> {
    let key = request.canonical_url();

    if let Some(entry) = self.lookup(&spec.name, &key) {
      self.schedule_revalidation(spec, request);
      let is_stale = entry.is_stale(spec.ttl());
      return Ok(CachedResponse::from_cache(entry, is_stale));
    }

    let response = self.fetch_with_timeout(request).await?;
    if !response.is_success() {
      return Err(eyre!(
        "Origin returned status {} for {}",
        response.status,
        request.url
      ));
    }

    self.write_back(&spec.name, &key, &response);
    Ok(CachedResponse::from_network(response))
  }

  async fn fetch_with_timeout(&self, request: &RequestDescriptor) -> Result<FetchedResponse> {
    match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(request)).await {
      Ok(result) => result,
      Err(_) => Err(eyre!(
        "Network fetch timed out after {:?} for {}",
        self.fetch_timeout,
        request.url
      )),
    }
  }

  /// Read an entry, treating store failures as a miss (fail open).
  fn lookup(&self, partition: &str, key: &str) -> Option<CacheEntry> {
    match self.store.get(partition, key) {
      Ok(entry) => entry,
      Err(err) => {
        tracing::warn!(partition, key, error = %err, "Cache read failed, treating as miss");
        None
      }
    }
  }

  /// Stamp and write a response. Write failures are logged and swallowed:
  /// the response is already in hand, so the request still succeeds.
  fn write_back(&self, partition: &str, key: &str, response: &FetchedResponse) {
    let entry = CacheEntry::stamp(response, Utc::now());

    if let Err(err) = self.store.put(partition, key, &entry) {
      tracing::warn!(partition, key, error = %err, "Cache write failed");
    }
  }

  /// Kick off a fire-and-forget refresh that overwrites the entry on
  /// success. Failures are logged inside the revalidator.
  ///
  /// The refresh fetch runs under the same time budget as synchronous
  /// fetches, so a hung origin releases its pool permit instead of
  /// holding it forever.
  fn schedule_revalidation(&self, spec: &PartitionSpec, request: &RequestDescriptor) {
    let store = Arc::clone(&self.store);
    let fetcher = Arc::clone(&self.fetcher);
    let partition = spec.name.clone();
    let key = request.canonical_url();
    let request = request.clone();
    let fetch_timeout = self.fetch_timeout;

    self.revalidator.schedule(key.clone(), async move {
      let response = match tokio::time::timeout(fetch_timeout, fetcher.fetch(&request)).await {
        Ok(result) => result?,
        Err(_) => {
          return Err(eyre!(
            "Revalidation fetch timed out after {:?} for {}",
            fetch_timeout,
            request.url
          ))
        }
      };

      if !response.is_success() {
        return Err(eyre!("Origin returned status {}", response.status));
      }

      let entry = CacheEntry::stamp(&response, Utc::now());
      store.put(&partition, &key, &entry)
    });
  }
}

impl<S: CacheStore> Clone for PolicyExecutor<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      fetcher: Arc::clone(&self.fetcher),
      revalidator: self.revalidator.clone(),
      fetch_timeout: self.fetch_timeout,
    }
  }
}

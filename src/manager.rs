//! Cache manager: owns the store handle, whitelist, and request pipeline.
//!
//! One `CacheManager` is constructed at startup and passed by reference into
//! every request handler; there are no ambient globals. The whitelist is
//! immutable for the process lifetime; only the store's contents mutate.

use color_eyre::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::classify::{Classification, Classifier};
use crate::config::Whitelist;
use crate::fetch::NetworkFetch;
use crate::policy::PolicyExecutor;
use crate::request::RequestDescriptor;
use crate::response::CachedResponse;
use crate::revalidate::Revalidator;
use crate::store::CacheStore;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REVALIDATION_CONCURRENCY: usize = 4;

/// Control-channel commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  /// Delete every partition immediately. Used for forced version upgrades.
  ClearAllCaches,
  /// Run whitelist garbage collection.
  Activate,
}

/// The cache layer's front door.
///
/// Classifies each intercepted request, runs the selected serving policy,
/// and services the control channel.
pub struct CacheManager<S: CacheStore> {
  store: Arc<S>,
  whitelist: Whitelist,
  classifier: Classifier,
  executor: PolicyExecutor<S>,
}

impl<S: CacheStore + 'static> CacheManager<S> {
  /// Create a manager for the given host origin.
  pub fn new(
    store: Arc<S>,
    fetcher: Arc<dyn NetworkFetch>,
    whitelist: Whitelist,
    origin: &Url,
  ) -> Self {
    Self::with_fetch_timeout(store, fetcher, whitelist, origin, DEFAULT_FETCH_TIMEOUT)
  }

  /// Create a manager with an explicit network time budget.
  pub fn with_fetch_timeout(
    store: Arc<S>,
    fetcher: Arc<dyn NetworkFetch>,
    whitelist: Whitelist,
    origin: &Url,
    fetch_timeout: Duration,
  ) -> Self {
    let revalidator = Revalidator::new(DEFAULT_REVALIDATION_CONCURRENCY);
    let executor = PolicyExecutor::new(Arc::clone(&store), fetcher, revalidator, fetch_timeout);

    Self {
      store,
      whitelist,
      classifier: Classifier::new(origin),
      executor,
    }
  }

  /// Handle one intercepted request.
  ///
  /// The host only ever observes a response or a network-style failure;
  /// store internals never surface here.
  pub async fn handle(&self, request: &RequestDescriptor) -> Result<CachedResponse> {
    match self.classifier.classify(&self.whitelist, request) {
      Classification::Route(spec) => {
        tracing::debug!(
          url = %request.url,
          partition = %spec.name,
          policy = ?spec.policy,
          "Routing request through cache"
        );
        self.executor.execute(spec, request).await
      }
      Classification::Bypass => {
        tracing::debug!(url = %request.url, "Bypassing cache");
        self.executor.pass_through(request).await
      }
    }
  }

  /// Service a control-channel command.
  pub fn dispatch(&self, command: Command) -> Result<()> {
    match command {
      Command::ClearAllCaches => self.clear_all(),
      Command::Activate => self.activate(),
    }
  }

  /// Whitelist garbage collection: delete every partition left over from a
  /// previous partition schema, then pre-open the whitelisted ones.
  ///
  /// Must run to completion before any request is classified.
  pub fn activate(&self) -> Result<()> {
    let existing = self.store.list_partitions()?;
    let whitelisted = self.whitelist.names();

    for name in existing.difference(&whitelisted) {
      tracing::info!(partition = %name, "Deleting partition not in whitelist");
      self.store.delete_partition(name)?;
    }

    for spec in &self.whitelist.partitions {
      self.store.open(&spec.name)?;
    }

    Ok(())
  }

  /// Delete every partition, whitelisted or not.
  pub fn clear_all(&self) -> Result<()> {
    for name in self.store.list_partitions()? {
      tracing::info!(partition = %name, "Clearing partition");
      self.store.delete_partition(&name)?;
    }

    Ok(())
  }

  /// Partitions currently present in the store.
  pub fn partitions(&self) -> Result<BTreeSet<String>> {
    self.store.list_partitions()
  }
}

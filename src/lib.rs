//! Edge cache: a request-interception layer with partitioned storage.
//!
//! Sits between a host application and the network, deciding per request
//! whether to serve from a local store, the network, or both:
//!
//! - Requests are classified into named partitions, each with its own TTL
//!   and serving policy (cache-first, network-first, stale-while-revalidate)
//! - Entries are stamped at write time; staleness is recomputed on every read
//! - Background revalidation keeps entries fresh without blocking callers
//! - Stale entries double as a degraded fallback when the network is down
//! - A whitelist of partitions drives garbage collection across versions

pub mod classify;
pub mod config;
pub mod entry;
pub mod fetch;
pub mod manager;
pub mod policy;
pub mod request;
pub mod response;
pub mod revalidate;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{PartitionSpec, Policy, Whitelist};
pub use entry::CacheEntry;
pub use manager::{CacheManager, Command};
pub use request::{RequestDescriptor, ResourceClass};
pub use response::{CachedResponse, ResponseSource};
pub use store::{CacheStore, MemoryStore, SqliteStore};

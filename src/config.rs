//! Partition whitelist configuration.
//!
//! The whitelist is the single piece of persisted configuration: an ordered
//! list of partitions, each with its own TTL and serving policy, plus a
//! version string. Evolving cache behavior means editing this list and
//! bumping the version; partitions no longer listed are garbage-collected on
//! the next activation.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const MINUTE: u64 = 60;
const DAY: u64 = 24 * 60 * 60;

/// Serving algorithm for a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
  /// Serve from cache when fresh, refreshing in the background
  CacheFirst,
  /// Always try the network first, falling back to cache on failure
  NetworkFirst,
  /// Serve any cached copy immediately while revalidating
  StaleWhileRevalidate,
}

/// A single named cache partition.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionSpec {
  pub name: String,
  pub ttl_seconds: u64,
  pub policy: Policy,
}

impl PartitionSpec {
  /// The partition TTL as a duration.
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.ttl_seconds as i64)
  }
}

/// The set of valid partitions, immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct Whitelist {
  /// Version string; bump alongside partition changes to force migration
  #[serde(default)]
  pub version: String,
  pub partitions: Vec<PartitionSpec>,
}

impl Default for Whitelist {
  fn default() -> Self {
    Self {
      version: "v1".to_string(),
      partitions: vec![
        PartitionSpec {
          name: "api".to_string(),
          ttl_seconds: 5 * MINUTE,
          policy: Policy::NetworkFirst,
        },
        PartitionSpec {
          name: "images".to_string(),
          ttl_seconds: 30 * DAY,
          policy: Policy::CacheFirst,
        },
        PartitionSpec {
          name: "static".to_string(),
          ttl_seconds: 7 * DAY,
          policy: Policy::CacheFirst,
        },
        PartitionSpec {
          name: "runtime".to_string(),
          ttl_seconds: 7 * DAY,
          policy: Policy::NetworkFirst,
        },
      ],
    }
  }
}

impl Whitelist {
  /// Look up a partition by name.
  pub fn get(&self, name: &str) -> Option<&PartitionSpec> {
    self.partitions.iter().find(|p| p.name == name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  /// The set of valid partition names.
  pub fn names(&self) -> BTreeSet<String> {
    self.partitions.iter().map(|p| p.name.clone()).collect()
  }

  /// Load the whitelist from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./edgecache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/edgecache/config.yaml
  ///
  /// Falls back to the built-in default whitelist when no file exists.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("edgecache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("edgecache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let whitelist: Whitelist = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(whitelist)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_whitelist_partitions() {
    let whitelist = Whitelist::default();

    let api = whitelist.get("api").unwrap();
    assert_eq!(api.ttl_seconds, 300);
    assert_eq!(api.policy, Policy::NetworkFirst);

    let images = whitelist.get("images").unwrap();
    assert_eq!(images.ttl_seconds, 30 * 24 * 60 * 60);
    assert_eq!(images.policy, Policy::CacheFirst);

    let statics = whitelist.get("static").unwrap();
    assert_eq!(statics.ttl_seconds, 7 * 24 * 60 * 60);
    assert_eq!(statics.policy, Policy::CacheFirst);

    let runtime = whitelist.get("runtime").unwrap();
    assert_eq!(runtime.policy, Policy::NetworkFirst);

    assert!(!whitelist.contains("precache"));
  }

  #[test]
  fn test_parse_yaml_whitelist() {
    let yaml = r#"
version: v7
partitions:
  - name: api
    ttl_seconds: 120
    policy: network-first
  - name: media
    ttl_seconds: 86400
    policy: stale-while-revalidate
"#;

    let whitelist: Whitelist = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(whitelist.version, "v7");
    assert_eq!(whitelist.partitions.len(), 2);
    assert_eq!(whitelist.get("api").unwrap().ttl_seconds, 120);
    assert_eq!(
      whitelist.get("media").unwrap().policy,
      Policy::StaleWhileRevalidate
    );
  }

  #[test]
  fn test_names_are_ordered_set() {
    let names = Whitelist::default().names();
    assert_eq!(
      names.into_iter().collect::<Vec<_>>(),
      vec!["api", "images", "runtime", "static"]
    );
  }
}

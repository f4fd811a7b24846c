//! Intercepted request descriptors.

use color_eyre::{eyre::eyre, Result};
use url::Url;

/// Coarse resource class of an intercepted request, as known to the host.
///
/// The host supplies this alongside the URL because some distinctions
/// (most notably a top-level document navigation) are not derivable from
/// the URL alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
  /// Script, stylesheet, or font supporting a page
  StaticAsset,
  /// Image resource
  Image,
  /// Data call against the host API
  Api,
  /// Top-level navigation loading a document
  Document,
}

/// Immutable description of a single intercepted network call.
///
/// Created per call and discarded after the request resolves.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
  /// HTTP method, uppercase
  pub method: String,
  /// Full request URL
  pub url: Url,
  /// Host-supplied resource class
  pub resource_class: ResourceClass,
}

impl RequestDescriptor {
  /// Create a descriptor from a method and URL string.
  pub fn new(method: &str, url: &str, resource_class: ResourceClass) -> Result<Self> {
    let url = Url::parse(url).map_err(|e| eyre!("Invalid request URL {}: {}", url, e))?;

    Ok(Self {
      method: method.to_ascii_uppercase(),
      url,
      resource_class,
    })
  }

  /// Convenience constructor for GET requests.
  pub fn get(url: &str, resource_class: ResourceClass) -> Result<Self> {
    Self::new("GET", url, resource_class)
  }

  pub fn is_get(&self) -> bool {
    self.method == "GET"
  }

  /// Canonical cache key for this request: the URL with any fragment stripped.
  ///
  /// Derived deterministically, so concurrent requests for the same resource
  /// map to the same entry.
  pub fn canonical_url(&self) -> String {
    let mut url = self.url.clone();
    url.set_fragment(None);
    url.to_string()
  }
}

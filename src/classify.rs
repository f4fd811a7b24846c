//! Maps intercepted requests to a cache partition, or to a bypass.

use url::Url;

use crate::config::{PartitionSpec, Whitelist};
use crate::request::RequestDescriptor;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico"];
const STATIC_EXTENSIONS: &[&str] = &["js", "css", "woff", "woff2", "ttf", "eot"];

/// Outcome of classifying a request.
#[derive(Debug)]
pub enum Classification<'a> {
  /// Serve through the cache layer using this partition's policy
  Route(&'a PartitionSpec),
  /// Go straight to network; nothing is read from or written to the store
  Bypass,
}

/// Classifies requests against the configured host origin.
///
/// Cross-origin requests always bypass the cache, which keeps third-party
/// origins from poisoning local partitions. Non-GET requests bypass too,
/// since they are never cacheable.
#[derive(Debug, Clone)]
pub struct Classifier {
  origin: String,
}

impl Classifier {
  pub fn new(origin: &Url) -> Self {
    Self {
      origin: origin.origin().ascii_serialization(),
    }
  }

  /// Select the partition for a request. First match wins:
  ///
  /// 1. URL path contains `/api/` → `api`
  /// 2. image extension → `images`
  /// 3. static-asset extension → `static`
  /// 4. top-level navigation → `runtime`
  /// 5. default → `runtime`
  ///
  /// A partition name missing from the whitelist fails open to bypass.
  pub fn classify<'a>(
    &self,
    whitelist: &'a Whitelist,
    request: &RequestDescriptor,
  ) -> Classification<'a> {
    if !request.is_get() {
      return Classification::Bypass;
    }

    if request.url.origin().ascii_serialization() != self.origin {
      return Classification::Bypass;
    }

    let name = Self::partition_name(request);

    match whitelist.get(name) {
      Some(spec) => Classification::Route(spec),
      None => Classification::Bypass,
    }
  }

  fn partition_name(request: &RequestDescriptor) -> &'static str {
    let path = request.url.path();

    if path.contains("/api/") {
      return "api";
    }

    match path_extension(path) {
      Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => return "images",
      Some(ext) if STATIC_EXTENSIONS.contains(&ext.as_str()) => return "static",
      _ => {}
    }

    // Top-level navigations and everything else share the runtime partition
    "runtime"
  }
}

/// Lowercased extension of the final path segment, if any.
fn path_extension(path: &str) -> Option<String> {
  let segment = path.rsplit('/').next()?;
  let (_, ext) = segment.rsplit_once('.')?;

  if ext.is_empty() {
    None
  } else {
    Some(ext.to_ascii_lowercase())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::request::ResourceClass;

  fn classifier() -> Classifier {
    Classifier::new(&Url::parse("https://example.com").unwrap())
  }

  fn classify_url(url: &str, class: ResourceClass) -> Option<String> {
    let whitelist = Whitelist::default();
    let request = RequestDescriptor::get(url, class).unwrap();

    match classifier().classify(&whitelist, &request) {
      Classification::Route(spec) => Some(spec.name.clone()),
      Classification::Bypass => None,
    }
  }

  #[test]
  fn test_api_path_wins() {
    assert_eq!(
      classify_url("https://example.com/api/agents", ResourceClass::Api),
      Some("api".to_string())
    );
  }

  #[test]
  fn test_api_path_beats_image_extension() {
    // Priority order: rule 1 applies even when the extension would match rule 2
    assert_eq!(
      classify_url("https://example.com/api/preview.png", ResourceClass::Image),
      Some("api".to_string())
    );
  }

  #[test]
  fn test_image_extensions() {
    for url in [
      "https://example.com/logo.png",
      "https://example.com/photo.JPEG",
      "https://example.com/icons/fav.ico?v=2",
    ] {
      assert_eq!(
        classify_url(url, ResourceClass::Image),
        Some("images".to_string()),
        "{url}"
      );
    }
  }

  #[test]
  fn test_static_asset_extensions() {
    assert_eq!(
      classify_url("https://example.com/app/main.js", ResourceClass::StaticAsset),
      Some("static".to_string())
    );
    assert_eq!(
      classify_url("https://example.com/fonts/ui.woff2", ResourceClass::StaticAsset),
      Some("static".to_string())
    );
  }

  #[test]
  fn test_navigation_goes_to_runtime() {
    assert_eq!(
      classify_url("https://example.com/dashboard", ResourceClass::Document),
      Some("runtime".to_string())
    );
  }

  #[test]
  fn test_default_goes_to_runtime() {
    assert_eq!(
      classify_url("https://example.com/manifest.webmanifest", ResourceClass::Api),
      Some("runtime".to_string())
    );
  }

  #[test]
  fn test_cross_origin_bypasses() {
    assert_eq!(
      classify_url("https://cdn.other.com/logo.png", ResourceClass::Image),
      None
    );
  }

  #[test]
  fn test_non_get_bypasses() {
    let whitelist = Whitelist::default();
    let request =
      RequestDescriptor::new("POST", "https://example.com/api/agents", ResourceClass::Api)
        .unwrap();

    assert!(matches!(
      classifier().classify(&whitelist, &request),
      Classification::Bypass
    ));
  }

  #[test]
  fn test_unlisted_partition_fails_open() {
    let whitelist = Whitelist {
      version: "v2".to_string(),
      partitions: vec![],
    };
    let request = RequestDescriptor::get("https://example.com/logo.png", ResourceClass::Image)
      .unwrap();

    assert!(matches!(
      classifier().classify(&whitelist, &request),
      Classification::Bypass
    ));
  }
}

//! Network side of the interception boundary.

use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::request::RequestDescriptor;

/// A response obtained from the network, before any caching decision.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: Vec<u8>,
}

impl FetchedResponse {
  /// Whether the origin reported success. Only successful responses are
  /// ever written to the store.
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// A boxed future resolving to a fetched response
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<FetchedResponse>> + Send>>;

/// Trait for issuing network fetches on behalf of the cache layer.
///
/// An `Err` from `fetch` means the network path failed entirely (connection
/// error); a resolved response with a non-success status is returned as
/// `Ok` and left to the caller to interpret.
pub trait NetworkFetch: Send + Sync {
  fn fetch(&self, request: &RequestDescriptor) -> FetchFuture;
}

/// HTTP fetcher backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .connect_timeout(std::time::Duration::from_secs(10))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl NetworkFetch for HttpFetcher {
  fn fetch(&self, request: &RequestDescriptor) -> FetchFuture {
    let client = self.client.clone();
    let method = request.method.clone();
    let url = request.url.to_string();

    Box::pin(async move {
      let method = reqwest::Method::from_bytes(method.as_bytes())
        .map_err(|e| eyre!("Invalid HTTP method {}: {}", method, e))?;

      let response = client
        .request(method, url.as_str())
        .send()
        .await
        .map_err(|e| eyre!("Network fetch failed for {}: {}", url, e))?;

      let status = response.status().as_u16();
      let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
          value
            .to_str()
            .ok()
            .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

      let body = response
        .bytes()
        .await
        .map_err(|e| eyre!("Failed to read response body for {}: {}", url, e))?
        .to_vec();

      Ok(FetchedResponse {
        status,
        headers,
        body,
      })
    })
  }
}

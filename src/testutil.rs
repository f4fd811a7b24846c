//! Shared helpers for unit tests.

use chrono::{Duration as ChronoDuration, Utc};
use color_eyre::eyre::eyre;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::entry::CacheEntry;
use crate::fetch::{FetchFuture, FetchedResponse, NetworkFetch};
use crate::request::RequestDescriptor;

pub(crate) fn response(status: u16, body: &[u8]) -> FetchedResponse {
  FetchedResponse {
    status,
    headers: BTreeMap::new(),
    body: body.to_vec(),
  }
}

/// An entry written `age_seconds` ago.
pub(crate) fn entry_aged(body: &[u8], age_seconds: i64) -> CacheEntry {
  CacheEntry {
    status: 200,
    headers: BTreeMap::new(),
    body: body.to_vec(),
    cached_at: Utc::now() - ChronoDuration::seconds(age_seconds),
  }
}

enum Outcome {
  Respond(FetchedResponse),
  Fail(String),
}

/// Scripted network fetcher: answers every fetch with a fixed outcome and
/// counts how often it was called.
pub(crate) struct StubFetcher {
  outcome: Outcome,
  delay: Option<Duration>,
  calls: AtomicUsize,
}

impl StubFetcher {
  pub fn respond(status: u16, body: &[u8]) -> Self {
    Self {
      outcome: Outcome::Respond(response(status, body)),
      delay: None,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn failing() -> Self {
    Self {
      outcome: Outcome::Fail("connection refused".to_string()),
      delay: None,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl NetworkFetch for StubFetcher {
  fn fetch(&self, _request: &RequestDescriptor) -> FetchFuture {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let outcome = match &self.outcome {
      Outcome::Respond(response) => Ok(response.clone()),
      Outcome::Fail(message) => Err(message.clone()),
    };
    let delay = self.delay;

    Box::pin(async move {
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      outcome.map_err(|message| eyre!(message))
    })
  }
}

//! Fire-and-forget background revalidation.
//!
//! Revalidation fetches keep entries fresh without blocking the caller.
//! Their failures are logged and swallowed, never surfaced to the original
//! request; a refresh racing a partition deletion resolves last-write-wins.

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded-concurrency pool for background refresh tasks.
#[derive(Clone)]
pub struct Revalidator {
  permits: Arc<Semaphore>,
}

impl Revalidator {
  /// Create a pool allowing at most `max_concurrent` refreshes in flight.
  pub fn new(max_concurrent: usize) -> Self {
    Self {
      permits: Arc::new(Semaphore::new(max_concurrent)),
    }
  }

  /// Schedule a refresh task. Errors are logged, never awaited by callers.
  pub fn schedule<F>(&self, key: String, task: F)
  where
    F: Future<Output = Result<()>> + Send + 'static,
  {
    let permits = Arc::clone(&self.permits);

    tokio::spawn(async move {
      let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        // Semaphore closed: shutting down
        Err(_) => return,
      };

      if let Err(err) = task.await {
        tracing::debug!(key = %key, error = %err, "Background revalidation failed");
      }
    });
  }
}

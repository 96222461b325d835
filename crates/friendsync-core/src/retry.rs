//! Bounded retry for idempotent store reads.
//!
//! Writes are never routed through here: re-running a bulk reset would
//! decrement reminder intervals twice.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total attempts including the first. `0` is treated as `1`.
  pub max_attempts:       u32,
  pub initial_backoff_ms: u64,
  pub max_backoff_ms:     u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts:       3,
      initial_backoff_ms: 50,
      max_backoff_ms:     1_000,
    }
  }
}

impl RetryPolicy {
  /// Delay before retry number `attempt` (1-based): doubles each time, capped.
  pub fn backoff(&self, attempt: u32) -> Duration {
    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(
      self
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(self.max_backoff_ms),
    )
  }

  /// Run `op` until it succeeds, fails with a non-transient error, or the
  /// attempt budget is spent.
  pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
  where
    E: StoreError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let attempts = self.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) if e.kind() == ErrorKind::Transient && attempt < attempts => {
          let delay = self.backoff(attempt);
          tracing::warn!(
            operation = what,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "transient store error, retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}

//! Bounded exponential-backoff retry for single network operations
//!
//! Transient failures are retried with a delay that starts at the configured
//! initial value and doubles on every further retry. A definitive absence
//! (HTTP 404) is not an `Err` at this level: the fetcher surfaces it as a
//! successful `FetchOutcome::NotFound`, so it is never retried. Exhausting
//! the retry budget is fatal upstream; persistent connectivity loss must not
//! be mistaken for a single missing asset.

use crate::harvest::ShutdownSignal;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry knobs shared by every network call in the pipeline
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time after
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(harvest: &crate::config::HarvestConfig) -> Self {
        Self {
            max_retries: harvest.retry_count,
            initial_delay: harvest.initial_delay(),
        }
    }
}

/// How a retried operation ultimately failed
#[derive(Debug)]
pub enum RetryError<E> {
    /// The retry budget ran out; carries the last underlying error
    Exhausted { attempts: u32, source: E },
    /// A shutdown signal fired during a backoff sleep
    Cancelled,
}

/// Runs `op` until it succeeds or the retry budget is exhausted
///
/// The backoff sleep races the shutdown signal so an interrupt aborts an
/// in-flight retry loop promptly instead of waiting out the delay.
pub async fn execute<T, E, F, Fut>(
    policy: &RetryPolicy,
    target: &str,
    shutdown: &ShutdownSignal,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(source) => {
                attempt += 1;
                if attempt > policy.max_retries {
                    return Err(RetryError::Exhausted { attempts: attempt, source });
                }

                tracing::warn!(
                    "retry {}/{} for {} in {:?}: {}",
                    attempt,
                    policy.max_retries,
                    target,
                    delay,
                    source
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.triggered() => return Err(RetryError::Cancelled),
                }

                delay *= 2;
            }
        }
    }
}

//! HTTP fetcher for the harvest pipeline
//!
//! Builds the shared reqwest client and wraps single GET requests in the
//! retry executor. Every fetch distinguishes two non-error outcomes: a body
//! and a definitive 404, which is business-level "not found" and must never
//! be retried or surfaced as a crash.

use crate::harvest::retry::{self, RetryError, RetryPolicy};
use crate::harvest::ShutdownSignal;
use crate::{HarvestError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Result of a single fetch once retries are resolved
#[derive(Debug)]
pub enum FetchOutcome {
    /// Response body for a successful request
    Body(Vec<u8>),
    /// The server definitively reported the resource absent (HTTP 404)
    NotFound,
}

/// Builds the HTTP client used for the whole run
///
/// The per-request timeout is a defensive deadline: the upstream archive
/// occasionally stops responding mid-transfer and the retry loop should get
/// the failure instead of hanging forever.
pub fn build_http_client(timeout: Duration) -> std::result::Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one GET request without retrying
///
/// Non-404 error statuses become `Err` so the retry executor treats them as
/// transient, matching the reference behavior of retrying 5xx and friends.
pub async fn fetch_once(
    client: &Client,
    url: &Url,
) -> std::result::Result<FetchOutcome, reqwest::Error> {
    let response = client.get(url.clone()).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(FetchOutcome::NotFound);
    }

    let response = response.error_for_status()?;
    Ok(FetchOutcome::Body(response.bytes().await?.to_vec()))
}

/// Fetches a URL through the bounded-retry executor
pub async fn fetch_with_retry(
    client: &Client,
    url: &Url,
    policy: &RetryPolicy,
    shutdown: &ShutdownSignal,
) -> Result<FetchOutcome> {
    retry::execute(policy, url.as_str(), shutdown, || fetch_once(client, url))
        .await
        .map_err(|e| match e {
            RetryError::Exhausted { attempts, source } => HarvestError::RetryExhausted {
                url: url.to_string(),
                attempts,
                source,
            },
            RetryError::Cancelled => HarvestError::Cancelled,
        })
}

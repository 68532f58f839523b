//! Harvest pipeline
//!
//! This module wires the phases together: enumerate the index, filter out
//! entries already resolved, extract image links, snapshot them to the link
//! cache, filter again by entry id, and download. Processing is strictly
//! sequential, one entry fully resolved before the next, which keeps the
//! progress store's crash consistency trivial to reason about.

mod downloader;
mod enumerator;
mod extractor;
mod fetcher;
mod retry;

pub use downloader::Downloader;
pub use enumerator::{enumerate, parse_index};
pub use extractor::{extension, extract, extract_image_links, is_image_link};
pub use fetcher::{build_http_client, fetch_once, fetch_with_retry, FetchOutcome};
pub use retry::{execute as execute_with_retry, RetryError, RetryPolicy};

use crate::cache::LinkCache;
use crate::config::Config;
use crate::progress::ProgressStore;
use crate::Result;
use std::fs;
use tokio::sync::watch;

/// Cooperative shutdown signal shared by every phase
///
/// Backed by a watch channel; the sender side is flipped once (on ctrl-c)
/// and every clone of the signal observes it. Backoff sleeps race it so
/// in-flight retries abort promptly.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires; pends forever if it never does
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                // Sender gone without firing: stay quiet forever
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Runs a complete harvest pass
///
/// A fresh pass crawls the index and entry pages before downloading; with
/// `resume-from-cache` enabled the crawl is skipped and the download phase
/// restarts from the persisted link records. Either way the progress store
/// is consulted first, so completed work is never repeated.
pub async fn run(config: Config) -> Result<()> {
    fs::create_dir_all(&config.archive.output_dir)?;

    let progress = ProgressStore::open(
        &config.archive.downloaded_list,
        &config.archive.not_found_list,
    )?;
    let cache = LinkCache::new(&config.archive.link_cache);
    let client = build_http_client(config.harvest.request_timeout())?;
    let policy = RetryPolicy::from_config(&config.harvest);

    let (shutdown_tx, shutdown) = ShutdownSignal::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing the current entry");
            let _ = shutdown_tx.send(true);
        }
    });

    let records = if config.harvest.resume_from_cache {
        tracing::info!("resuming from link cache {}", cache.path().display());
        cache.load()?
    } else {
        let entries = enumerate(&client, &config, &policy, &shutdown).await?;
        tracing::info!("index listed {} entries", entries.len());

        let entries = progress.filter(entries, |entry| entry.as_str())?;
        tracing::info!("{} entries left to crawl", entries.len());

        let records = extract(&client, &config, &entries, &progress, &policy, &shutdown).await?;
        cache.save(&records)?;
        records
    };

    let records = progress.filter(records, |record| record.entry.as_str())?;
    tracing::info!("{} assets to download", records.len());

    let downloader = Downloader::new(&client, &config, &progress, policy, shutdown);
    downloader.download_all(&records).await?;

    tracing::info!("harvest pass complete");
    Ok(())
}

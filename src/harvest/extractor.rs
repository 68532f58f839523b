//! Image link extraction
//!
//! Visits each unresolved entry page and looks for `<img>` elements whose
//! immediate parent is an `<a>`. Both the anchor target and the image source
//! are run through the extension classifier; a record is emitted carrying
//! whichever of the two qualified. Entries yielding no qualifying image are
//! marked not-found immediately so partial progress survives a crash
//! mid-crawl.

use crate::config::Config;
use crate::harvest::fetcher::{fetch_with_retry, FetchOutcome};
use crate::harvest::retry::RetryPolicy;
use crate::harvest::ShutdownSignal;
use crate::model::{EntryId, LinkRecord};
use crate::progress::ProgressStore;
use crate::{HarvestError, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

/// The substring following the final `.` of a link, if any
pub fn extension(link: &str) -> Option<&str> {
    link.rfind('.')
        .map(|idx| &link[idx + 1..])
        .filter(|ext| !ext.is_empty())
}

/// Classifies a candidate link by extension membership in the allow-list
///
/// Case-sensitive on purpose: this mirrors the reference behavior, which
/// never saw uppercase extensions in the wild archive.
pub fn is_image_link(link: &str, extensions: &[String]) -> bool {
    match extension(link) {
        Some(ext) => extensions.iter().any(|allowed| allowed == ext),
        None => false,
    }
}

/// Scans one entry page for image candidates
///
/// Every `<img>` directly wrapped by an `<a>` contributes one record if the
/// anchor href and/or the img src qualifies; the non-qualifying field is
/// left absent. An entry page can legitimately yield several records.
pub fn extract_image_links(
    entry: &EntryId,
    html: &str,
    extensions: &[String],
) -> Vec<LinkRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    let img_selector = match Selector::parse("img") {
        Ok(selector) => selector,
        Err(_) => return records,
    };

    for img in document.select(&img_selector) {
        let parent = match img.parent().and_then(ElementRef::wrap) {
            Some(parent) if parent.value().name() == "a" => parent,
            _ => continue,
        };

        let anchor_target = parent
            .value()
            .attr("href")
            .filter(|href| is_image_link(href, extensions))
            .map(str::to_string);
        let image_source = img
            .value()
            .attr("src")
            .filter(|src| is_image_link(src, extensions))
            .map(str::to_string);

        if anchor_target.is_some() || image_source.is_some() {
            records.push(LinkRecord {
                entry: entry.clone(),
                anchor_target,
                image_source,
            });
        }
    }

    records
}

/// Fetches every entry page and collects the qualifying link records
///
/// Side effect: entries whose page is gone (404) or carries no qualifying
/// image are appended to the not-found set immediately, one entry at a
/// time. Unexpected per-entry failures are logged and skipped without
/// marking; retry exhaustion and cancellation abort the crawl.
pub async fn extract(
    client: &Client,
    config: &Config,
    entries: &[EntryId],
    progress: &ProgressStore,
    policy: &RetryPolicy,
    shutdown: &ShutdownSignal,
) -> Result<Vec<LinkRecord>> {
    let total = entries.len();
    let mut records = Vec::new();

    for (processed, entry) in entries.iter().enumerate() {
        if shutdown.is_triggered() {
            return Err(HarvestError::Cancelled);
        }

        match extract_entry(client, config, entry, policy, shutdown).await {
            Ok(Some(found)) if !found.is_empty() => records.extend(found),
            Ok(_) => progress.mark_not_found(entry)?,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("skipping entry {} this run: {}", entry, e),
        }

        if (processed + 1) % 25 == 0 {
            tracing::info!("extracted links from {}/{} entries", processed + 1, total);
        }
    }

    tracing::info!(
        "extraction complete: {} link records from {} entries",
        records.len(),
        total
    );
    Ok(records)
}

/// Processes a single entry page; `None` means the page itself was absent
async fn extract_entry(
    client: &Client,
    config: &Config,
    entry: &EntryId,
    policy: &RetryPolicy,
    shutdown: &ShutdownSignal,
) -> Result<Option<Vec<LinkRecord>>> {
    let url = config.source.resolve(entry.as_str())?;

    match fetch_with_retry(client, &url, policy, shutdown).await? {
        FetchOutcome::Body(body) => {
            let html = String::from_utf8_lossy(&body);
            Ok(Some(extract_image_links(
                entry,
                &html,
                &config.harvest.image_extensions,
            )))
        }
        FetchOutcome::NotFound => Ok(None),
    }
}

//! Archive index enumeration
//!
//! Fetches the index page and extracts the ordered list of entry ids from
//! its anchor collection, optionally narrowed to a pagination window. The
//! anchors live inside the first `<b>` element of the page; if that element
//! is gone the index format has changed and the run aborts, since retrying
//! an unchanged malformed page cannot help.

use crate::config::Config;
use crate::harvest::fetcher::{fetch_with_retry, FetchOutcome};
use crate::harvest::retry::RetryPolicy;
use crate::harvest::ShutdownSignal;
use crate::model::EntryId;
use crate::{HarvestError, Result};
use reqwest::Client;
use scraper::{Html, Selector};

/// Fetches the index and returns the windowed entry list in document order
pub async fn enumerate(
    client: &Client,
    config: &Config,
    policy: &RetryPolicy,
    shutdown: &ShutdownSignal,
) -> Result<Vec<EntryId>> {
    let index_url = config.source.index_url()?;
    tracing::info!("fetching archive index {}", index_url);

    let body = match fetch_with_retry(client, &index_url, policy, shutdown).await? {
        FetchOutcome::Body(body) => body,
        // Definitive absence of the index, as opposed to a shape change
        FetchOutcome::NotFound => {
            return Err(HarvestError::IndexMissing {
                url: index_url.to_string(),
            })
        }
    };

    let html = String::from_utf8_lossy(&body);
    parse_index(&html, config.harvest.take, config.harvest.skip)
}

/// Extracts entry ids from the index HTML and applies the window
///
/// `take`/`skip` select the sub-range `[skip, skip+take)` of the anchor
/// list; zero/zero means the full list. Order is significant downstream:
/// it is the archive's own publication order.
pub fn parse_index(html: &str, take: usize, skip: usize) -> Result<Vec<EntryId>> {
    let document = Html::parse_document(html);

    let bold_selector = Selector::parse("b")
        .map_err(|e| HarvestError::IndexFormat(format!("bad selector: {}", e)))?;
    let anchor_selector = Selector::parse("a[href]")
        .map_err(|e| HarvestError::IndexFormat(format!("bad selector: {}", e)))?;

    let bold = document.select(&bold_selector).next().ok_or_else(|| {
        HarvestError::IndexFormat("anchor collection (<b> element) missing from index".to_string())
    })?;

    let entries = bold
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(EntryId::new);

    if take == 0 && skip == 0 {
        Ok(entries.collect())
    } else {
        Ok(entries.skip(skip).take(take).collect())
    }
}

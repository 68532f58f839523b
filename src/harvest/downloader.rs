//! Asset download phase
//!
//! Walks the filtered link records and materializes each asset on disk
//! exactly once. An entry page can yield several records; they are
//! processed as one unit and the entry is marked exactly once, after its
//! outcome is fully determined: downloaded as soon as any record's
//! candidate succeeds, not-found only when every candidate of every record
//! resolved to a definitive absence. Within a record, candidates are tried
//! in order (anchor target, then image source). A single bad record never
//! aborts the batch; only retry exhaustion and cancellation do.

use crate::config::Config;
use crate::harvest::extractor::extension;
use crate::harvest::fetcher::{fetch_with_retry, FetchOutcome};
use crate::harvest::retry::RetryPolicy;
use crate::harvest::ShutdownSignal;
use crate::model::{DownloadOutcome, EntryId, LinkRecord};
use crate::progress::ProgressStore;
use crate::{HarvestError, Result};
use reqwest::Client;
use std::fs;
use std::path::PathBuf;

/// Downloads assets for link records and records the outcomes
pub struct Downloader<'a> {
    client: &'a Client,
    config: &'a Config,
    progress: &'a ProgressStore,
    policy: RetryPolicy,
    shutdown: ShutdownSignal,
}

impl<'a> Downloader<'a> {
    pub fn new(
        client: &'a Client,
        config: &'a Config,
        progress: &'a ProgressStore,
        policy: RetryPolicy,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            client,
            config,
            progress,
            policy,
            shutdown,
        }
    }

    /// Processes every record, marking each entry's outcome exactly once
    ///
    /// Records sharing an entry id are adjacent in crawl order and are
    /// resolved as one group; an entry already present in either progress
    /// set is skipped wholesale, so the downloaded and not-found sets stay
    /// disjoint even across duplicate records.
    pub async fn download_all(&self, records: &[LinkRecord]) -> Result<()> {
        let total = records.len();
        let mut entries_done = 0usize;

        for group in records.chunk_by(|a, b| a.entry == b.entry) {
            if self.shutdown.is_triggered() {
                return Err(HarvestError::Cancelled);
            }

            let entry = &group[0].entry;
            if self.progress.is_resolved(entry)? {
                tracing::debug!("{} already resolved, skipping {} record(s)", entry, group.len());
                continue;
            }

            match self.download_entry(group).await {
                Ok(Some(DownloadOutcome::Downloaded)) => {
                    self.progress.mark_downloaded(entry)?;
                }
                Ok(Some(DownloadOutcome::NotFound)) => {
                    tracing::info!("no source yielded an asset for {}", entry);
                    self.progress.mark_not_found(entry)?;
                }
                // Outcome undetermined this run; left unmarked so a later
                // run can try again
                Ok(None) => {}
                Err(e) => return Err(e),
            }

            entries_done += 1;
            if entries_done % 25 == 0 {
                tracing::info!("resolved {} entries so far", entries_done);
            }
        }

        tracing::info!(
            "download phase complete: {} records across {} entries",
            total,
            entries_done
        );
        Ok(())
    }

    /// Resolves one entry's group of records to a single outcome
    ///
    /// `Ok(None)` means some record failed unexpectedly and none succeeded,
    /// so the entry's outcome could not be fully determined. Fatal errors
    /// propagate; anything else is logged per record and absorbed.
    async fn download_entry(&self, group: &[LinkRecord]) -> Result<Option<DownloadOutcome>> {
        let mut undetermined = false;

        for record in group {
            match self.download_record(record).await {
                Ok(DownloadOutcome::Downloaded) => {
                    return Ok(Some(DownloadOutcome::Downloaded))
                }
                Ok(DownloadOutcome::NotFound) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    undetermined = true;
                    tracing::warn!("failed to store asset for {}: {}", record.entry, e);
                }
            }
        }

        if undetermined {
            Ok(None)
        } else {
            Ok(Some(DownloadOutcome::NotFound))
        }
    }

    /// Tries the record's candidates in order and reports the outcome
    pub async fn download_record(&self, record: &LinkRecord) -> Result<DownloadOutcome> {
        let candidates = [
            record.anchor_target.as_deref(),
            record.image_source.as_deref(),
        ];

        for link in candidates.into_iter().flatten() {
            if self.fetch_candidate(&record.entry, link).await? {
                return Ok(DownloadOutcome::Downloaded);
            }
        }

        Ok(DownloadOutcome::NotFound)
    }

    /// Attempts one candidate link; `Ok(true)` means the asset is on disk
    async fn fetch_candidate(&self, entry: &EntryId, link: &str) -> Result<bool> {
        let path = self.asset_path(entry, link)?;

        // Idempotent short-circuit: never refetch an asset already archived
        if !self.config.harvest.overwrite_existing && path.exists() {
            tracing::debug!("{} already archived at {}", entry, path.display());
            return Ok(true);
        }

        let url = self.config.source.resolve(link)?;
        match fetch_with_retry(self.client, &url, &self.policy, &self.shutdown).await? {
            FetchOutcome::Body(bytes) => {
                fs::write(&path, &bytes)?;
                tracing::debug!("wrote {} bytes to {}", bytes.len(), path.display());
                Ok(true)
            }
            FetchOutcome::NotFound => Ok(false),
        }
    }

    /// Local path for an asset: entry stem plus the candidate's extension
    fn asset_path(&self, entry: &EntryId, link: &str) -> Result<PathBuf> {
        let ext = extension(link).ok_or_else(|| HarvestError::AssetName {
            entry: entry.to_string(),
            link: link.to_string(),
        })?;

        let filename = format!("{}.{}", entry.stem(), ext);
        Ok(self.config.archive.output_dir.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_config(output_dir: &str) -> Config {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[source]
base-url = "https://apod.nasa.gov/apod/"
index-page = "archivepix.html"

[archive]
output-dir = "{}"

[harvest]
"#,
            output_dir
        )
        .unwrap();
        file.flush().unwrap();
        load_config(file.path()).unwrap()
    }

    fn downloader_parts(output_dir: &str) -> (Config, ProgressStore, tempfile::TempDir) {
        let config = test_config(output_dir);
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::open(
            &dir.path().join("downloaded.txt"),
            &dir.path().join("not_found.txt"),
        )
        .unwrap();
        (config, store, dir)
    }

    #[test]
    fn test_asset_path_derivation() {
        let (config, progress, _dir) = downloader_parts("/archive/images");
        let client = Client::new();
        let (_, shutdown) = ShutdownSignal::channel();
        let downloader = Downloader::new(
            &client,
            &config,
            &progress,
            RetryPolicy::from_config(&config.harvest),
            shutdown,
        );

        let path = downloader
            .asset_path(&EntryId::new("ap250101.html"), "image/2501/galaxy.jpg")
            .unwrap();
        assert_eq!(path, PathBuf::from("/archive/images/ap250101.jpg"));
    }

    #[test]
    fn test_asset_path_rejects_extensionless_link() {
        let (config, progress, _dir) = downloader_parts("/archive/images");
        let client = Client::new();
        let (_, shutdown) = ShutdownSignal::channel();
        let downloader = Downloader::new(
            &client,
            &config,
            &progress,
            RetryPolicy::from_config(&config.harvest),
            shutdown,
        );

        let result = downloader.asset_path(&EntryId::new("ap250101.html"), "image/noext");
        assert!(matches!(result, Err(HarvestError::AssetName { .. })));
    }
}

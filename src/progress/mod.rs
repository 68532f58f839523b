//! Persisted harvest progress
//!
//! The progress store is the sole resume checkpoint of the pipeline: two
//! append-only line files holding the ids of entries whose asset has been
//! downloaded and of entries that yielded no image. The two sets are kept
//! disjoint: the first mark for an id wins, and an id present in either set
//! is permanently excluded from further processing.
//!
//! Marks are synced to disk before the call returns, so a crash immediately
//! after a mark never loses it, and a crash before never falsely records it.

use crate::model::EntryId;
use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Append-only store of downloaded / not-found entry ids
pub struct ProgressStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    downloaded: HashSet<EntryId>,
    not_found: HashSet<EntryId>,
    downloaded_file: File,
    not_found_file: File,
}

impl ProgressStore {
    /// Opens the store, creating the list files when absent
    ///
    /// Both files are read fully into memory; the append handles stay open
    /// for the life of the store.
    pub fn open(downloaded_path: &Path, not_found_path: &Path) -> Result<Self> {
        let (downloaded, downloaded_file) = open_list(downloaded_path)?;
        let (not_found, not_found_file) = open_list(not_found_path)?;

        Ok(Self {
            inner: Mutex::new(StoreInner {
                downloaded,
                not_found,
                downloaded_file,
                not_found_file,
            }),
        })
    }

    /// Records that the entry's asset is on disk
    ///
    /// An id already recorded as not-found is left untouched: the first
    /// mark wins, so an id never lands in both list files.
    pub fn mark_downloaded(&self, id: &EntryId) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.not_found.contains(id) {
            return Ok(());
        }
        if inner.downloaded.insert(id.clone()) {
            append_line(&mut inner.downloaded_file, id)?;
        }
        Ok(())
    }

    /// Records that the entry yielded no image
    ///
    /// A no-op for ids already recorded as downloaded, mirroring
    /// [`ProgressStore::mark_downloaded`].
    pub fn mark_not_found(&self, id: &EntryId) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.downloaded.contains(id) {
            return Ok(());
        }
        if inner.not_found.insert(id.clone()) {
            append_line(&mut inner.not_found_file, id)?;
        }
        Ok(())
    }

    /// Whether the id is already present in either set
    pub fn is_resolved(&self, id: &EntryId) -> Result<bool> {
        let inner = self.lock()?;
        Ok(inner.downloaded.contains(id) || inner.not_found.contains(id))
    }

    /// Snapshot of the downloaded set
    pub fn downloaded(&self) -> Result<HashSet<EntryId>> {
        Ok(self.lock()?.downloaded.clone())
    }

    /// Snapshot of the not-found set
    pub fn not_found(&self) -> Result<HashSet<EntryId>> {
        Ok(self.lock()?.not_found.clone())
    }

    /// Drops items whose key is blank or already present in either set
    ///
    /// This is the single exclusion primitive of the pipeline, applied to
    /// entry ids before the crawl and to link records before the download
    /// phase. Filtering an already-filtered collection is a no-op.
    pub fn filter<T, F>(&self, items: Vec<T>, key: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> &str,
    {
        let inner = self.lock()?;
        Ok(items
            .into_iter()
            .filter(|item| {
                let id = key(item);
                !id.trim().is_empty()
                    && !inner.downloaded.contains(id)
                    && !inner.not_found.contains(id)
            })
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| HarvestError::Store("progress store mutex poisoned".to_string()))
    }
}

fn open_list(path: &Path) -> Result<(HashSet<EntryId>, File)> {
    let file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?;

    let mut set = HashSet::new();
    for line in BufReader::new(&file).lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            set.insert(EntryId::new(id));
        }
    }

    Ok((set, file))
}

fn append_line(file: &mut File, id: &EntryId) -> Result<()> {
    writeln!(file, "{}", id)?;
    // Committed marks must survive a crash right after this call
    file.sync_data()?;
    Ok(())
}

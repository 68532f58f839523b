//! Link cache snapshot
//!
//! Persists the full sequence of extracted link records so the download
//! phase can be re-run without re-crawling (one HTTP fetch per entry). The
//! snapshot is replaced wholesale on every fresh crawl; it is written to a
//! temp file and renamed into place so readers never observe a torn file.

use crate::model::LinkRecord;
use crate::{HarvestError, Result};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Snapshot of the extracted link records on disk
pub struct LinkCache {
    path: PathBuf,
}

impl LinkCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replaces the snapshot with the given records
    pub fn save(&self, records: &[LinkRecord]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)?;

        let mut tmp_name = OsString::from(self.path.as_os_str());
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!("saved {} link records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Loads the snapshot back, preserving record order
    pub fn load(&self) -> Result<Vec<LinkRecord>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(HarvestError::CacheMissing {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryId;
    use tempfile::TempDir;

    fn sample_records() -> Vec<LinkRecord> {
        vec![
            LinkRecord {
                entry: EntryId::new("ap250101.html"),
                anchor_target: Some("image/2501/big.jpg".to_string()),
                image_source: Some("image/2501/small.jpg".to_string()),
            },
            LinkRecord {
                entry: EntryId::new("ap250102.html"),
                anchor_target: None,
                image_source: Some("image/2501/other.png".to_string()),
            },
        ]
    }

    #[test]
    fn test_save_then_load_preserves_records_and_order() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path().join("links.json"));

        let records = sample_records();
        cache.save(&records).unwrap();

        assert_eq!(cache.load().unwrap(), records);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path().join("links.json"));

        cache.save(&sample_records()).unwrap();
        let shorter = vec![sample_records().remove(0)];
        cache.save(&shorter).unwrap();

        assert_eq!(cache.load().unwrap(), shorter);
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path().join("links.json"));

        assert!(matches!(
            cache.load(),
            Err(HarvestError::CacheMissing { .. })
        ));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path().join("links.json"));
        cache.save(&sample_records()).unwrap();

        assert!(!dir.path().join("links.json.tmp").exists());
    }
}

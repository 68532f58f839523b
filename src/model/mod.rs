//! Core records shared across the harvest phases

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier for one archive entry, derived from its relative URL
/// on the index page (e.g. `ap250101.html`).
///
/// Stable across runs; this is the primary dedup key for the progress store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entry's bare name: directory prefix and final extension stripped.
    ///
    /// Used to derive the local asset filename (`ap250101.html` -> `ap250101`).
    pub fn stem(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match name.rfind('.') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One image candidate found behind an archive entry.
///
/// At least one of the two link fields is present: each carries the URL only
/// if it passed the extension classifier, so the downloader can try them in
/// order without re-classifying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub entry: EntryId,
    pub anchor_target: Option<String>,
    pub image_source: Option<String>,
}

/// Terminal outcome for one link record in the download phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The asset is on disk (freshly fetched or already present)
    Downloaded,
    /// Every candidate source reported a definitive absence
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_strips_extension() {
        assert_eq!(EntryId::new("ap250101.html").stem(), "ap250101");
    }

    #[test]
    fn test_stem_strips_directory_prefix() {
        assert_eq!(EntryId::new("archive/ap250101.html").stem(), "ap250101");
    }

    #[test]
    fn test_stem_without_extension() {
        assert_eq!(EntryId::new("ap250101").stem(), "ap250101");
    }

    #[test]
    fn test_entry_id_borrows_as_str() {
        let mut set = std::collections::HashSet::new();
        set.insert(EntryId::new("ap250101.html"));
        assert!(set.contains("ap250101.html"));
        assert!(!set.contains("ap250102.html"));
    }

    #[test]
    fn test_link_record_json_roundtrip() {
        let record = LinkRecord {
            entry: EntryId::new("ap250101.html"),
            anchor_target: Some("image/2501/big.jpg".to_string()),
            image_source: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: LinkRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}

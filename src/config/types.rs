use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Apod-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub archive: ArchiveConfig,
    pub harvest: HarvestConfig,
}

/// Upstream archive location
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL every relative link is resolved against (must end with '/')
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Index page listing the archive entries, relative to the base URL
    #[serde(rename = "index-page")]
    pub index_page: String,
}

impl SourceConfig {
    /// Absolute URL of the archive index page
    pub fn index_url(&self) -> Result<Url, url::ParseError> {
        self.resolve(&self.index_page)
    }

    /// Resolves a relative link (entry page or asset) against the base URL
    pub fn resolve(&self, relative: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(relative)
    }
}

/// Local storage locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Directory the downloaded assets are written into
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Append-only list of entry ids whose asset has been downloaded
    #[serde(rename = "downloaded-list", default = "default_downloaded_list")]
    pub downloaded_list: PathBuf,

    /// Append-only list of entry ids that yielded no image
    #[serde(rename = "not-found-list", default = "default_not_found_list")]
    pub not_found_list: PathBuf,

    /// Link cache snapshot, fully replaced on each crawl
    #[serde(rename = "link-cache", default = "default_link_cache")]
    pub link_cache: PathBuf,
}

/// Harvest behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// File extensions accepted by the image-link classifier (case-sensitive)
    #[serde(rename = "image-extensions", default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Maximum number of retries after a transient network failure
    #[serde(rename = "retry-count", default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff delay before the first retry; doubles on every further retry
    #[serde(rename = "retry-initial-delay-ms", default = "default_retry_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Per-request deadline so a silent server cannot hang the run
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Pagination window over the index anchor list; zero/zero means all
    #[serde(default)]
    pub take: usize,

    #[serde(default)]
    pub skip: usize,

    /// Start at the download phase from the cached link records
    #[serde(rename = "resume-from-cache", default)]
    pub resume_from_cache: bool,

    /// Re-fetch assets that already exist on disk
    #[serde(rename = "overwrite-existing", default)]
    pub overwrite_existing: bool,
}

impl HarvestConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_downloaded_list() -> PathBuf {
    PathBuf::from("downloaded.txt")
}

fn default_not_found_list() -> PathBuf {
    PathBuf::from("image_not_found.txt")
}

fn default_link_cache() -> PathBuf {
    PathBuf::from("loaded_links.json")
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "bmp", "png", "tiff", "tif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_retry_count() -> u32 {
    15
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    60
}

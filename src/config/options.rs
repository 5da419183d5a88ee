// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestOptions {
    pub source: SourceOptions,
    pub strategy: Strategy,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            source: SourceOptions::default(),
            strategy: Strategy::FanOut(BulkOptions::default()),
        }
    }
}

/// Where the index lives and how we present ourselves to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceOptions {
    pub base_url: String,
    /// Listing path template; `{page}` is replaced with the 1-based page number.
    pub listing_path: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            listing_path: s!(LISTING_PATH),
            user_agent: s!(USER_AGENT),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl SourceOptions {
    pub fn listing_url(&self, page: u32) -> String {
        let path = self.listing_path.replace("{page}", &page.to_string());
        join!(self.base_url.trim_end_matches('/'), &path)
    }
}

/// Scheduling strategy. Both variants share one extractor/enumerator pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Enumerate a fixed page range concurrently, then fetch every unknown record concurrently.
    FanOut(BulkOptions),
    /// Walk pages in order from page 1 and stop at the previous run's high-water mark.
    Sequential(IncrementalOptions),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkOptions {
    pub first_page: u32,
    pub last_page: u32,
    pub page_workers: usize,
    pub detail_workers: usize,
    pub store_path: PathBuf,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            first_page: 1,
            last_page: BULK_PAGES,
            page_workers: PAGE_WORKERS,
            detail_workers: DETAIL_WORKERS,
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
        }
    }
}

impl BulkOptions {
    pub fn pages(&self) -> Vec<u32> {
        (self.first_page..=self.last_page).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncrementalOptions {
    pub archive_dir: PathBuf,
    pub archive_name: String,
    /// Upper bound of the uniform delay between consecutive detail fetches.
    pub pacing_max: Duration,
    /// How many recently seen identifiers to remember for duplicate skipping.
    pub recent_window: usize,
    /// Hard cap on pages walked; `None` walks until the mark or an empty page.
    pub max_pages: Option<u32>,
    /// Consecutive listing failures tolerated while a mark is set.
    pub max_failed_pages: u32,
}

impl Default for IncrementalOptions {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
            archive_name: s!(DEFAULT_ARCHIVE_NAME),
            pacing_max: Duration::from_millis(PACING_MAX_MS),
            recent_window: RECENT_WINDOW,
            max_pages: None,
            max_failed_pages: MAX_FAILED_PAGES,
        }
    }
}

impl IncrementalOptions {
    pub fn snapshot_path(&self) -> PathBuf {
        self.archive_dir.join(SNAPSHOT_FILE)
    }
}

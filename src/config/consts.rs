// src/config/consts.rs

// Source
pub const BASE_URL: &str = "https://proverkacheka.com";
pub const LISTING_PATH: &str = "/check&p={page}";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

// Local store
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";
pub const DEFAULT_STORE_FILE: &str = "all_items.json";
pub const DEFAULT_ARCHIVE_DIR: &str = "archive";
pub const DEFAULT_ARCHIVE_NAME: &str = "checks";
pub const SNAPSHOT_FILE: &str = "latest.json";
pub const ARCHIVE_DATE_FMT: &str = "%d_%m_%Y";

// Bulk mode
pub const BULK_PAGES: u32 = 10;
pub const PAGE_WORKERS: usize = 10;
pub const DETAIL_WORKERS: usize = 25; // detail fetches outnumber pages

// Incremental mode
pub const PACING_MAX_MS: u64 = 500;
pub const RECENT_WINDOW: usize = 25; // adjacent listing pages repeat entries
pub const MAX_FAILED_PAGES: u32 = 3; // consecutive, while walking towards a mark

// src/scrape/harvest.rs
//! One harvest pipeline, two scheduling strategies.
//!
//! Both strategies share the same listing enumerator and receipt extractor
//! ([`Pipeline`]); they differ only in how jobs are scheduled and when
//! pagination ends:
//!
//! - `FanOut`: all pages of a fixed range concurrently, then every unknown
//!   check concurrently; the union with the existing store is written back.
//! - `Sequential`: pages in order from 1, entries in page order, stopping at
//!   the first id at or below the previous snapshot's mark. New records are
//!   written newest-first to a dated archive and to the rolling snapshot.
//!   A failed listing page counts as empty and the walk goes on; if the walk
//!   cannot prove it saw everything above the mark, the snapshot is kept.
//!
//! Per-page and per-check failures are logged and counted; only the store
//! can abort a run.

use std::{fmt, path::PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::options::{BulkOptions, HarvestOptions, IncrementalOptions, SourceOptions, Strategy},
    common::net::Fetch,
    error::{EnumerationError, ExtractionError, HarvestError},
    model::{CheckId, Receipt},
    progress::Progress,
    specs::{listing::{self, ListingEntry}, receipt},
    store,
};

use super::resume::{Cursor, HighWaterMark, KnownIds, Verdict};
use super::schedule::{fan_out, walk_pages, Flow, Pacer};

/// What a run did. Printed by the CLI at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub pages_visited: u32,
    pub new_records: usize,
    pub stored_records: usize,
    pub failed_checks: Vec<CheckId>,
    pub failed_pages: Vec<u32>,
    /// Incremental only: the first id found at or below the mark.
    pub stopped_at: Option<CheckId>,
    pub written: Vec<PathBuf>,
    /// Incremental only: the walk ended short of the mark, so the old
    /// snapshot (and its mark) was left in place.
    pub snapshot_kept: bool,
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pages visited:   {}", self.pages_visited)?;
        writeln!(f, "New records:     {}", self.new_records)?;
        writeln!(f, "Stored records:  {}", self.stored_records)?;
        if let Some(id) = self.stopped_at {
            writeln!(f, "Stopped at:      {id}")?;
        }
        if !self.failed_pages.is_empty() {
            writeln!(f, "Failed pages:    {:?}", self.failed_pages)?;
        }
        if !self.failed_checks.is_empty() {
            writeln!(f, "Failed checks:   {:?}", self.failed_checks)?;
        }
        for p in &self.written {
            writeln!(f, "Wrote {}", p.display())?;
        }
        if self.snapshot_kept {
            writeln!(f, "Snapshot kept:   walk did not reach the previous mark")?;
        }
        Ok(())
    }
}

/// Listing enumerator + receipt extractor bound to one source.
pub struct Pipeline<'a> {
    fetcher: &'a dyn Fetch,
    source: &'a SourceOptions,
    base: Url,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetch, source: &'a SourceOptions) -> Result<Self, HarvestError> {
        let base = Url::parse(&source.base_url)
            .map_err(|e| HarvestError::BaseUrl { url: source.base_url.clone(), source: e })?;
        Ok(Self { fetcher, source, base })
    }

    pub fn listing(&self, page: u32) -> Result<Vec<ListingEntry>, EnumerationError> {
        let url = self.source.listing_url(page);
        debug!(page, %url, "fetching listing page");
        listing::fetch(self.fetcher, &url, &self.base, page)
    }

    pub fn receipt(&self, entry: &ListingEntry) -> Result<Receipt, ExtractionError> {
        debug!(check_id = entry.check_id, url = %entry.detail_url, "fetching receipt");
        receipt::fetch(self.fetcher, &entry.detail_url, entry.check_id)
    }
}

/// Run the configured strategy, dating archives with today's local date.
pub fn run(
    options: &HarvestOptions,
    fetcher: &dyn Fetch,
    progress: &mut dyn Progress,
) -> Result<HarvestReport, HarvestError> {
    run_on(options, fetcher, progress, Local::now().date_naive())
}

/// Same as [`run`] with an explicit archive date.
pub fn run_on(
    options: &HarvestOptions,
    fetcher: &dyn Fetch,
    progress: &mut dyn Progress,
    today: NaiveDate,
) -> Result<HarvestReport, HarvestError> {
    let pipeline = Pipeline::new(fetcher, &options.source)?;
    match &options.strategy {
        Strategy::FanOut(bulk) => run_fan_out(&pipeline, bulk, progress),
        Strategy::Sequential(inc) => run_sequential(&pipeline, inc, progress, today),
    }
}

/* ---------------- bulk ---------------- */

fn run_fan_out(
    pipeline: &Pipeline<'_>,
    opts: &BulkOptions,
    progress: &mut dyn Progress,
) -> Result<HarvestReport, HarvestError> {
    let mut records = store::load_records(&opts.store_path)?;
    info!(count = records.len(), path = %opts.store_path.display(), "loaded store");
    let mut known = KnownIds::from_records(&records);
    let mut report = HarvestReport::default();

    // Stage 1: every page of the range.
    let pages = opts.pages();
    progress.begin("Listing pages", Some(pages.len()));
    let listed = fan_out(&pages, opts.page_workers, |page| pipeline.listing(*page), progress);
    progress.finish();
    report.pages_visited = u32::try_from(pages.len()).unwrap_or(u32::MAX);

    let mut entries = Vec::new();
    for outcome in listed {
        match outcome {
            Ok(found) => entries.extend(found),
            Err(e) => {
                warn!(page = e.page, error = %e, "listing page failed");
                report.failed_pages.push(e.page);
            }
        }
    }
    report.failed_pages.sort_unstable();

    // Stage 2: only what the store has not seen (and each id once).
    let listed_total = entries.len();
    let pending: Vec<ListingEntry> = entries.into_iter().filter(|e| known.admit(e.check_id)).collect();
    info!(listed = listed_total, pending = pending.len(), "deduplicated against store");

    progress.begin("Parsing checks", Some(pending.len()));
    let extracted = fan_out(&pending, opts.detail_workers, |entry| pipeline.receipt(entry), progress);
    progress.finish();

    let fresh = collect_receipts(extracted, &mut report.failed_checks);
    report.new_records = store::merge_new(&mut records, fresh);
    report.stored_records = records.len();

    progress.log("Saving store…");
    store::save_records(&opts.store_path, &records)?;
    report.written.push(opts.store_path.clone());
    info!(added = report.new_records, total = report.stored_records, "bulk harvest complete");
    Ok(report)
}

/* ---------------- incremental ---------------- */

fn run_sequential(
    pipeline: &Pipeline<'_>,
    opts: &IncrementalOptions,
    progress: &mut dyn Progress,
    today: NaiveDate,
) -> Result<HarvestReport, HarvestError> {
    let snapshot_path = opts.snapshot_path();
    let snapshot = store::load_records(&snapshot_path)?;
    let mut cursor = Cursor::new(HighWaterMark::from_snapshot(&snapshot), opts.recent_window);
    info!(mark = ?cursor.mark().0, "resuming from snapshot");
    drop(snapshot);

    let mut report = HarvestReport::default();
    let mut fresh: Vec<Receipt> = Vec::new();
    let mut pacer = Pacer::new(opts.pacing_max);
    let has_mark = cursor.mark().0.is_some();
    let mut failed_in_a_row = 0u32;
    let mut reached_end = false;

    progress.begin("Parsing checks", None);
    report.pages_visited = walk_pages(opts.max_pages, |page| {
        let entries = match pipeline.listing(page) {
            Ok(entries) => entries,
            Err(e) => {
                report.failed_pages.push(page);
                if !has_mark {
                    warn!(page, error = %e, "listing page failed, ending walk");
                    return Flow::Stop;
                }
                failed_in_a_row += 1;
                if failed_in_a_row >= opts.max_failed_pages {
                    warn!(page, error = %e, failed_in_a_row, "too many listing failures in a row, ending walk");
                    return Flow::Stop;
                }
                warn!(page, error = %e, "listing page failed, treated as empty");
                return Flow::Continue;
            }
        };
        failed_in_a_row = 0;
        if entries.is_empty() {
            info!(page, "empty listing page, ending walk");
            reached_end = true;
            return Flow::Stop;
        }

        for entry in &entries {
            match cursor.judge(entry.check_id) {
                Verdict::Stop => {
                    info!(page, check_id = entry.check_id, "reached high-water mark");
                    report.stopped_at = Some(entry.check_id);
                    return Flow::Stop;
                }
                Verdict::SkipDuplicate => {
                    debug!(page, check_id = entry.check_id, "repeated entry skipped");
                    continue;
                }
                Verdict::Fetch => {}
            }

            pacer.wait();
            match pipeline.receipt(entry) {
                Ok(r) => {
                    progress.item_done();
                    fresh.push(r);
                }
                Err(e) => {
                    warn!(check_id = e.check_id, error = %e, "check not harvested");
                    progress.item_failed();
                    report.failed_checks.push(e.check_id);
                }
            }
        }
        Flow::Continue
    });
    progress.finish();

    // Moving the mark is only safe once every id above it has been listed.
    let walk_complete = report.failed_pages.is_empty() && (report.stopped_at.is_some() || reached_end);
    report.snapshot_kept = has_mark && !walk_complete;

    let mut delta = Vec::with_capacity(fresh.len());
    report.new_records = store::merge_new(&mut delta, fresh);
    report.stored_records = delta.len();

    if delta.is_empty() {
        // Keep the previous snapshot so its mark survives.
        info!("no new records, snapshot left untouched");
        return Ok(report);
    }

    // The archive holds this run's delta only.
    store::sort_descending(&mut delta);
    let archive = store::archive_path(&opts.archive_dir, &opts.archive_name, today);
    progress.log("Saving archive…");
    store::save_records(&archive, &delta)?;
    report.written.push(archive);

    if report.snapshot_kept {
        warn!(
            failed_pages = ?report.failed_pages,
            "walk ended short of the mark, snapshot left untouched"
        );
    } else {
        store::save_records(&snapshot_path, &delta)?;
        report.written.push(snapshot_path);
    }
    info!(added = report.new_records, "incremental harvest complete");
    Ok(report)
}

fn collect_receipts(
    outcomes: Vec<Result<Receipt, ExtractionError>>,
    failed: &mut Vec<CheckId>,
) -> Vec<Receipt> {
    let mut fresh = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(r) => fresh.push(r),
            Err(e) => {
                warn!(check_id = e.check_id, error = %e, "check not harvested");
                failed.push(e.check_id);
            }
        }
    }
    failed.sort_unstable();
    fresh
}

// src/cli.rs
use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};

use crate::{
    config::{
        consts::*,
        options::{BulkOptions, HarvestOptions, IncrementalOptions, SourceOptions, Strategy},
    },
    common::net::HttpFetcher,
    log,
    progress::Progress,
    scrape,
};

#[derive(Parser, Debug)]
#[command(name = "harvest", author, version, about = "Harvest fiscal receipts from a paginated public index")]
pub struct Cli {
    /// Origin of the receipt index
    #[arg(long, global = true, default_value = BASE_URL)]
    base_url: String,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG wins if set
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Do not append to .store/debug.log
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Hide the progress line
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Scan a fixed page range concurrently and merge new checks into one store
    Bulk(BulkArgs),
    /// Walk pages from the newest until the previous run's last check
    #[command(alias = "update")]
    Incremental(IncrementalArgs),
}

#[derive(Args, Debug)]
struct BulkArgs {
    /// Number of listing pages to scan, starting at page 1
    #[arg(long, default_value_t = BULK_PAGES)]
    pages: u32,

    /// Concurrent listing page fetches
    #[arg(long, default_value_t = PAGE_WORKERS)]
    page_workers: usize,

    /// Concurrent receipt fetches
    #[arg(long, default_value_t = DETAIL_WORKERS)]
    detail_workers: usize,

    /// Record store (JSON array)
    #[arg(short, long, default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,
}

#[derive(Args, Debug)]
struct IncrementalArgs {
    /// Directory for dated archives and the rolling snapshot
    #[arg(long, default_value = DEFAULT_ARCHIVE_DIR)]
    archive_dir: PathBuf,

    /// Archive file prefix: <name>_<DD_MM_YYYY>.json
    #[arg(long, default_value = DEFAULT_ARCHIVE_NAME)]
    archive_name: String,

    /// Upper bound of the random pause between receipt fetches, in ms
    #[arg(long, default_value_t = PACING_MAX_MS)]
    pacing_ms: u64,

    /// How many recent ids to remember when skipping repeated entries
    #[arg(long, default_value_t = RECENT_WINDOW)]
    window: usize,

    /// Stop after this many pages even if the mark was not reached
    #[arg(long)]
    max_pages: Option<u32>,

    /// Give up after this many listing pages fail in a row
    #[arg(long, default_value_t = MAX_FAILED_PAGES)]
    max_failed_pages: u32,
}

impl Cli {
    pub fn options(&self) -> HarvestOptions {
        let source = SourceOptions { base_url: self.base_url.clone(), ..Default::default() };
        let strategy = match &self.mode {
            Mode::Bulk(a) => Strategy::FanOut(BulkOptions {
                first_page: 1,
                last_page: a.pages,
                page_workers: a.page_workers,
                detail_workers: a.detail_workers,
                store_path: a.store.clone(),
            }),
            Mode::Incremental(a) => Strategy::Sequential(IncrementalOptions {
                archive_dir: a.archive_dir.clone(),
                archive_name: a.archive_name.clone(),
                pacing_max: Duration::from_millis(a.pacing_ms),
                recent_window: a.window,
                max_pages: a.max_pages,
                max_failed_pages: a.max_failed_pages,
            }),
        };
        HarvestOptions { source, strategy }
    }
}

pub fn run() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let log_path = (!cli.no_log_file).then(log::default_log_path);
    log::init(cli.verbose, log_path.as_deref());

    let options = cli.options();
    let fetcher = HttpFetcher::new(&options.source).wrap_err("cannot build HTTP client")?;

    let mut progress = TermProgress::new(cli.quiet);
    let report = scrape::run(&options, &fetcher, &mut progress).wrap_err("harvest aborted")?;

    print!("{report}");
    println!("Harvest complete.");
    Ok(())
}

/// Single-line progress on stderr.
pub struct TermProgress {
    quiet: bool,
    stage: String,
    total: Option<usize>,
    done: usize,
    failed: usize,
}

impl TermProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, stage: s!(), total: None, done: 0, failed: 0 }
    }

    fn redraw(&self) {
        if self.quiet {
            return;
        }
        let seen = self.done + self.failed;
        let line = match self.total {
            Some(t) => format!("\r{}: {seen}/{t} ({} failed)", self.stage, self.failed),
            None => format!("\r{}: {seen} ({} failed)", self.stage, self.failed),
        };
        let mut err = io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

impl Progress for TermProgress {
    fn begin(&mut self, stage: &str, total: Option<usize>) {
        self.stage = s!(stage);
        self.total = total;
        self.done = 0;
        self.failed = 0;
        self.redraw();
    }
    fn log(&mut self, msg: &str) {
        if !self.quiet {
            eprintln!("{msg}");
        }
    }
    fn item_done(&mut self) {
        self.done += 1;
        self.redraw();
    }
    fn item_failed(&mut self) {
        self.failed += 1;
        self.redraw();
    }
    fn finish(&mut self) {
        if !self.quiet {
            eprintln!();
        }
    }
}

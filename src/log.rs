// src/log.rs
//! Logging setup.
//!
//! Human-readable lines go to stderr; the same events are appended without
//! colour to `.store/debug.log`. `RUST_LOG` overrides the verbosity chosen on
//! the command line. If the log file cannot be opened, stderr still works.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::consts::{LOG_FILE, STORE_DIR};

pub fn default_log_path() -> PathBuf {
    Path::new(STORE_DIR).join(LOG_FILE)
}

/// Map `-v` counts to a default filter directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call once per process; later calls are no-ops.
pub fn init(verbosity: u8, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file_layer = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)).boxed())
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .try_init();
}

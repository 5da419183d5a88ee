// src/error.rs
//! Failure classes of a harvest run.
//!
//! Only [`StoreError`] is fatal. Everything else is caught at the job
//! boundary, logged with its check id or page number, and the run goes on.

use std::path::PathBuf;

use thiserror::Error;

/// A request failed or came back with a status we cannot extract from.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} is not available")]
    Unavailable { url: String },
}

#[derive(Debug, Error)]
#[error("listing page {page}: {cause}")]
pub struct EnumerationError {
    pub page: u32,
    #[source]
    pub cause: EnumerationCause,
}

#[derive(Debug, Error)]
pub enum EnumerationCause {
    #[error("listing region not found")]
    MissingRegion,
    #[error("listing table not found")]
    MissingTable,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A detail document could not be turned into a record. The record is
/// dropped as a whole and stays eligible for a later run.
#[derive(Debug, Error)]
#[error("check {check_id}: {cause}")]
pub struct ExtractionError {
    pub check_id: u64,
    #[source]
    pub cause: ExtractionCause,
}

#[derive(Debug, Error)]
pub enum ExtractionCause {
    #[error("receipt table not found")]
    MissingTable,
    #[error("row {row} has {found} cells, expected {expected}")]
    CellCount { row: usize, expected: usize, found: usize },
    #[error("{field}: {text:?} is not a number")]
    NotANumber { field: &'static str, text: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ExtractionError {
    pub fn new(check_id: u64, cause: impl Into<ExtractionCause>) -> Self {
        Self { check_id, cause: cause.into() }
    }
}

/// The persisted store could not be read or written. Aborts the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid record store: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode records for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid base url {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

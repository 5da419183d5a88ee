// src/lib.rs

#[macro_use]
pub mod macros;

pub mod config;
pub mod common;
pub mod error;
pub mod log;
pub mod model;
pub mod progress;
pub mod scrape;
pub mod specs;
pub mod store;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::options::{HarvestOptions, Strategy};
pub use common::net::{Fetch, HttpFetcher};
pub use model::{LineItem, Metadata, Receipt};
pub use scrape::{run, HarvestReport};

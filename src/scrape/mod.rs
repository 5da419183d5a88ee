// src/scrape/mod.rs
pub mod harvest;
pub mod resume;
pub mod schedule;

pub use harvest::{run, run_on, HarvestReport, Pipeline};

//! # Scraping "specs" module
//!
//! Page-specific readers for the receipt index. Each spec covers one kind of
//! page and encodes *where the data lives in the markup* and *how to read it*.
//!
//! ## What lives here
//! - **Pure markup parsing** of listing pages (`listing`) and receipt detail
//!   pages (`receipt`), each with a `parse_doc` that tests can feed fixtures.
//! - **Field grammars**: the ordered field lists and fixed labels (`fields`).
//! - A thin `fetch()` per page that pairs a [`Fetch`](crate::common::Fetch)
//!   with its `parse_doc`.
//!
//! ## What does **not** live here
//! - **Scheduling, dedup, resume** (`scrape::*`).
//! - **Persistence** (`store`).
//!
//! ## Typical call chain
//! ```text
//! cli → scrape::harvest::run → specs::listing::fetch  → Vec<ListingEntry>
//!                            ↘ specs::receipt::fetch  → Receipt
//!       store::save_* (after the run)
//! ```
//!
//! ## Conventions
//! - Failures are per page / per check and carry the page number or check id.
//! - A receipt is returned whole or not at all.
pub mod fields;
pub mod listing;
pub mod receipt;

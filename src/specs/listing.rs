// src/specs/listing.rs
//! Scraping *spec* for one page of the receipt index.
//!
//! Layout: the first `div.col-md-9` holds several `div.row` blocks; the second
//! one contains the listing `<table>`. Data rows carry no class; header and
//! pagination rows do and are skipped. A data row's first cell is the check
//! id and its first link points at the detail page.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::common::html::{css, is_unmarked, select_all, text_of};
use crate::common::net::Fetch;
use crate::error::{EnumerationCause, EnumerationError};
use crate::model::CheckId;

static MAIN_BLOCK: LazyLock<Selector> = LazyLock::new(|| css("div.col-md-9"));
static ROW_BLOCK: LazyLock<Selector> = LazyLock::new(|| css("div.row"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| css("table"));
static TR: LazyLock<Selector> = LazyLock::new(|| css("tr"));
static TD: LazyLock<Selector> = LazyLock::new(|| css("td"));
static LINK: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));

/// Index of the `div.row` block holding the listing table.
const LISTING_BLOCK: usize = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    pub check_id: CheckId,
    pub detail_url: String,
}

/// Fetch a listing page and enumerate it.
pub fn fetch(fetcher: &dyn Fetch, url: &str, base: &Url, page: u32) -> Result<Vec<ListingEntry>, EnumerationError> {
    let html_doc = fetcher
        .get(url)
        .map_err(|e| EnumerationError { page, cause: e.into() })?;
    parse_doc(&html_doc, base, page)
}

/// Entries of one listing page, in page order. Split out for tests.
pub fn parse_doc(html_doc: &str, base: &Url, page: u32) -> Result<Vec<ListingEntry>, EnumerationError> {
    let fail = |cause| EnumerationError { page, cause };
    let doc = Html::parse_document(html_doc);

    let main = doc.select(&MAIN_BLOCK).next().ok_or_else(|| fail(EnumerationCause::MissingRegion))?;
    let block = main
        .select(&ROW_BLOCK)
        .nth(LISTING_BLOCK)
        .ok_or_else(|| fail(EnumerationCause::MissingRegion))?;
    let table = block.select(&TABLE).next().ok_or_else(|| fail(EnumerationCause::MissingTable))?;

    let mut out = Vec::new();
    for (idx, tr) in select_all(table, &TR).into_iter().enumerate() {
        if !is_unmarked(tr) {
            continue;
        }

        let id_text = tr.select(&TD).next().map(text_of).unwrap_or_default();
        let Ok(check_id) = id_text.parse::<CheckId>() else {
            tracing::warn!(page, row = idx, text = %id_text, "listing row without a numeric check id, skipped");
            continue;
        };

        let Some(href) = tr.select(&LINK).next().and_then(|a| a.value().attr("href")) else {
            tracing::warn!(page, check_id, "listing row without a detail link, skipped");
            continue;
        };
        let detail_url = match base.join(href.trim()) {
            Ok(u) => u.to_string(),
            Err(e) => {
                tracing::warn!(page, check_id, href, error = %e, "unresolvable detail link, skipped");
                continue;
            }
        };

        out.push(ListingEntry { check_id, detail_url });
    }
    Ok(out)
}

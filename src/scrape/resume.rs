// src/scrape/resume.rs
//! Resume/dedup state.
//!
//! Bulk runs consult a [`KnownIds`] set built from the existing store. Incremental
//! runs walk the listing newest-first and consult a [`Cursor`]: the previous
//! snapshot's [`HighWaterMark`] decides when to stop, and a short
//! [`RecentWindow`] skips entries the index repeats across adjacent pages.

use std::collections::{HashSet, VecDeque};

use crate::model::{CheckId, Receipt};

/// Identifiers already persisted, plus anything admitted during this run.
#[derive(Debug, Default, Clone)]
pub struct KnownIds(HashSet<CheckId>);

impl KnownIds {
    pub fn from_records(records: &[Receipt]) -> Self {
        Self(records.iter().map(|r| r.check_id).collect())
    }

    pub fn contains(&self, id: CheckId) -> bool {
        self.0.contains(&id)
    }

    /// True if `id` was unknown; it is known from now on.
    pub fn admit(&mut self, id: CheckId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Highest identifier harvested by the previous incremental run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HighWaterMark(pub Option<CheckId>);

impl HighWaterMark {
    /// The snapshot is stored sorted descending, so the mark is its first element.
    pub fn from_snapshot(snapshot: &[Receipt]) -> Self {
        Self(snapshot.first().map(|r| r.check_id))
    }

    pub fn reached_by(&self, id: CheckId) -> bool {
        self.0.is_some_and(|mark| id <= mark)
    }
}

/// Bounded FIFO of recently seen identifiers.
#[derive(Debug, Clone)]
pub struct RecentWindow {
    cap: usize,
    ids: VecDeque<CheckId>,
}

impl RecentWindow {
    pub fn new(cap: usize) -> Self {
        Self { cap, ids: VecDeque::with_capacity(cap) }
    }

    /// Record `id`. Returns true if it was already in the window.
    pub fn observe(&mut self, id: CheckId) -> bool {
        if self.ids.contains(&id) {
            return true;
        }
        if self.cap == 0 {
            return false;
        }
        if self.ids.len() == self.cap {
            self.ids.pop_front();
        }
        self.ids.push_back(id);
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New record: fetch it.
    Fetch,
    /// Seen a moment ago on the previous page.
    SkipDuplicate,
    /// At or below the mark: stop the whole walk here.
    Stop,
}

/// Incremental walk state, fed entries strictly in listing order.
#[derive(Debug, Clone)]
pub struct Cursor {
    mark: HighWaterMark,
    recent: RecentWindow,
}

impl Cursor {
    pub fn new(mark: HighWaterMark, window: usize) -> Self {
        Self { mark, recent: RecentWindow::new(window) }
    }

    pub fn mark(&self) -> HighWaterMark {
        self.mark
    }

    pub fn judge(&mut self, id: CheckId) -> Verdict {
        if self.mark.reached_by(id) {
            return Verdict::Stop;
        }
        if self.recent.observe(id) {
            return Verdict::SkipDuplicate;
        }
        Verdict::Fetch
    }
}

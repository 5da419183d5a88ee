// src/scrape/schedule.rs
//! Job scheduling policies.
//!
//! - [`fan_out`]: bounded worker pool on plain threads. Workers pull the next
//!   job index from a shared counter and send each outcome back over a
//!   channel; the calling thread collects in completion order and drives
//!   progress. A failing (or panicking) job never stops its siblings.
//! - [`walk_pages`] + [`Pacer`]: one page at a time, in order, with a jittered
//!   pause between consecutive detail fetches.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{atomic::{AtomicUsize, Ordering}, mpsc},
    thread,
    time::Duration,
};

use rand::Rng;

use crate::progress::Progress;

/// Run `work` over every job with at most `workers` threads.
/// Returns every outcome, in completion order. Panicking jobs are logged and dropped.
pub fn fan_out<J, O, E, F>(
    jobs: &[J],
    workers: usize,
    work: F,
    progress: &mut dyn Progress,
) -> Vec<Result<O, E>>
where
    J: Sync,
    O: Send,
    E: Send,
    F: Fn(&J) -> Result<O, E> + Sync,
{
    if jobs.is_empty() {
        return Vec::new();
    }

    let workers = workers.clamp(1, jobs.len());
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, thread::Result<Result<O, E>>)>();
    let mut outcomes = Vec::with_capacity(jobs.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            let work = &work;
            scope.spawn(move || loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                if i >= jobs.len() {
                    break;
                }
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&jobs[i])));
                if tx.send((i, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx); // collector is the sole receiver now

        for (i, outcome) in rx {
            match outcome {
                Ok(result) => {
                    if result.is_ok() { progress.item_done() } else { progress.item_failed() }
                    outcomes.push(result);
                }
                Err(_) => {
                    tracing::error!(job = i, "job panicked, outcome dropped");
                    progress.item_failed();
                }
            }
        }
    });

    outcomes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Visit pages `1, 2, 3, …` in order until `visit` says stop or `max_pages` is hit.
/// Returns the number of pages visited.
pub fn walk_pages(max_pages: Option<u32>, mut visit: impl FnMut(u32) -> Flow) -> u32 {
    let mut page = 1u32;
    loop {
        if max_pages.is_some_and(|max| page > max) {
            return page - 1;
        }
        if visit(page) == Flow::Stop {
            return page;
        }
        page += 1;
    }
}

/// Uniform random pause in `0..=max` before every call but the first.
pub struct Pacer {
    max: Duration,
    primed: bool,
}

impl Pacer {
    pub fn new(max: Duration) -> Self {
        Self { max, primed: false }
    }

    pub fn wait(&mut self) {
        if !self.primed {
            self.primed = true;
            return;
        }
        if self.max.is_zero() {
            return;
        }
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        let pause = rand::thread_rng().gen_range(0..=max_ms);
        thread::sleep(Duration::from_millis(pause));
    }
}

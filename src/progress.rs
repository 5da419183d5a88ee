/// Lightweight progress reporting used by long-running harvest stages.
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called when a stage starts, with the number of jobs if known.
    fn begin(&mut self, _stage: &str, _total: Option<usize>) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One job finished successfully (a page enumerated, a receipt extracted).
    fn item_done(&mut self) {}

    /// One job failed; the failure itself is logged by the caller.
    fn item_failed(&mut self) {}

    /// Called at the end of a stage, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Counts calls; handy for tests and summaries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub stages: Vec<(String, Option<usize>)>,
    pub done: usize,
    pub failed: usize,
}

impl Progress for Tally {
    fn begin(&mut self, stage: &str, total: Option<usize>) {
        self.stages.push((s!(stage), total));
    }
    fn item_done(&mut self) {
        self.done += 1;
    }
    fn item_failed(&mut self) {
        self.failed += 1;
    }
}

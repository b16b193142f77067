//! Batch extraction events.
//!
//! [`extract_files`](crate::extract_files) reports each step of a batch to a
//! [`BatchObserver`]. The terminal progress bar lives in
//! `schedule_cli_utils`; library callers and tests use [`Silent`].

use std::path::Path;

/// How a single file in a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Extracted { pages: usize, records: usize },
    Failed,
}

/// Receives batch extraction events, in order, from a single task.
pub trait BatchObserver: Send + Sync {
    fn batch_started(&self, file_count: usize);

    /// `index` is zero-based.
    fn file_started(&self, index: usize, path: &Path);

    fn file_finished(&self, path: &Path, outcome: FileOutcome);

    fn batch_finished(&self, records: usize, failures: usize);
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl BatchObserver for Silent {
    fn batch_started(&self, _file_count: usize) {}
    fn file_started(&self, _index: usize, _path: &Path) {}
    fn file_finished(&self, _path: &Path, _outcome: FileOutcome) {}
    fn batch_finished(&self, _records: usize, _failures: usize) {}
}

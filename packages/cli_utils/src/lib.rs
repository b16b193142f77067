#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the schedule CLI: logger setup and a progress bar
//! that follows a batch extraction file by file.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use schedule_pdf::progress::{BatchObserver, FileOutcome};

pub use indicatif::{MultiProgress, ProgressDrawTarget};

/// Per-file progress bar for [`schedule_pdf::extract_files`].
///
/// Spins until the batch size is known, then shows `n/total` with the
/// running record count.
pub struct FileProgressBar {
    bar: ProgressBar,
    records: AtomicUsize,
}

impl FileProgressBar {
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Reading PDFs");

        Self {
            bar,
            records: AtomicUsize::new(0),
        }
    }

    fn records(&self) -> usize {
        self.records.load(Ordering::Relaxed)
    }
}

impl BatchObserver for FileProgressBar {
    fn batch_started(&self, file_count: usize) {
        self.bar.set_length(file_count as u64);
        self.bar.set_position(0);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{msg:30!} {wide_bar:.green/dim} {pos}/{len} PDFs [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
    }

    fn file_started(&self, _index: usize, path: &Path) {
        let name = path.file_name().unwrap_or(path.as_os_str());
        self.bar
            .set_message(format!("{} ({} found)", name.to_string_lossy(), self.records()));
    }

    fn file_finished(&self, _path: &Path, outcome: FileOutcome) {
        if let FileOutcome::Extracted { records, .. } = outcome {
            self.records.fetch_add(records, Ordering::Relaxed);
        }
        self.bar.inc(1);
    }

    fn batch_finished(&self, records: usize, failures: usize) {
        let msg = if failures == 0 {
            format!("{records} appointments found")
        } else {
            format!("{records} appointments found, {failures} PDF(s) skipped")
        };
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge` and returns
/// the [`MultiProgress`] every progress bar must be added to.
///
/// Logs at `warn` unless `RUST_LOG` says otherwise. Calling it twice keeps
/// the first logger.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}

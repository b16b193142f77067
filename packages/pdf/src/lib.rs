#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Appointment schedule extraction from PDF text layers.
//!
//! Schedules exported by practice-management tools arrive as PDFs whose text
//! layer holds one appointment per row, in one of several layouts. This
//! crate pulls the text out with pure-Rust extraction ([`pdf_extract`]),
//! normalizes each page, and matches rows against the configured
//! [`layout`]s using the [`regex_rows`] engine.
//!
//! The primary entry point is [`extract_files`], which processes a batch of
//! files strictly one after another and tolerates per-file failures.

pub mod layout;
pub mod progress;
pub mod regex_rows;
pub mod text;

use std::path::{Path, PathBuf};

use schedule_models::Schedule;

use crate::layout::CompiledLayout;
use crate::progress::{BatchObserver, FileOutcome};

/// Characters of context logged around a doctor name when a document
/// yields no records.
const DIAGNOSTIC_CONTEXT_CHARS: usize = 50;

/// Errors specific to PDF schedule extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// A layout pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// A layout TOML document is malformed.
    #[error("Invalid layout config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A layout definition is unusable.
    #[error("Invalid layout '{id}': {message}")]
    Layout {
        /// Id of the offending layout.
        id: String,
        /// What is wrong with it.
        message: String,
    },

    /// A requested layout id is not registered.
    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking extraction task could not be joined.
    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Options controlling how records are extracted.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Layouts to match, in priority order.
    pub layouts: Vec<CompiledLayout>,
    /// Only keep records for this doctor, if set.
    pub doctor: Option<String>,
}

impl ExtractOptions {
    /// Creates options matching the given layouts for every doctor.
    #[must_use]
    pub const fn new(layouts: Vec<CompiledLayout>) -> Self {
        Self {
            layouts,
            doctor: None,
        }
    }

    /// Restricts extraction to records for `doctor`. An empty or blank name
    /// leaves extraction unrestricted.
    #[must_use]
    pub fn with_doctor(mut self, doctor: &str) -> Self {
        let doctor = doctor.trim();
        self.doctor = (!doctor.is_empty()).then(|| doctor.to_owned());
        self
    }
}

/// Records extracted from a single document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Label identifying the document in logs (usually its path).
    pub source: String,
    /// Number of pages in the document.
    pub page_count: usize,
    /// Records in page order.
    pub records: Schedule,
}

/// A file that could not be processed in a batch.
#[derive(Debug)]
pub struct FileFailure {
    /// Path of the failed file.
    pub path: PathBuf,
    /// Why it failed.
    pub error: PdfError,
}

/// The outcome of [`extract_files`].
#[derive(Debug, Default)]
pub struct BatchExtraction {
    /// Records from every successfully processed file, in input order.
    pub records: Schedule,
    /// Per-file summaries for successfully processed files.
    pub documents: Vec<DocumentSummary>,
    /// Files that failed and were skipped.
    pub failures: Vec<FileFailure>,
}

/// Page and record counts for one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Label identifying the document.
    pub source: String,
    /// Number of pages in the document.
    pub page_count: usize,
    /// Number of records extracted from it.
    pub record_count: usize,
}

/// Extracts records from already-extracted page texts.
///
/// Pages are matched independently and in order; a row never spans a page
/// boundary.
#[must_use]
pub fn extract_from_pages(
    pages: &[String],
    source: &str,
    options: &ExtractOptions,
) -> ExtractedDocument {
    let mut records = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        let text = text::normalize_page_text(page);
        log::trace!("[{source}] Page {} content: {text}", i + 1);

        let page_records =
            regex_rows::extract_page(&text, &options.layouts, options.doctor.as_deref());
        log::debug!(
            "[{source}] Page {}/{}: {} records",
            i + 1,
            pages.len(),
            page_records.len()
        );
        records.extend(page_records);
    }

    if records.is_empty() {
        log_no_matches(pages, source, options);
    }

    ExtractedDocument {
        source: source.to_owned(),
        page_count: pages.len(),
        records,
    }
}

fn log_no_matches(pages: &[String], source: &str, options: &ExtractOptions) {
    let layout_ids: Vec<&str> = options.layouts.iter().map(|l| l.id.as_str()).collect();
    log::debug!(
        "[{source}] No records matched layouts [{}]",
        layout_ids.join(", ")
    );

    let Some(doctor) = options.doctor.as_deref() else {
        return;
    };

    let full_text = pages
        .iter()
        .map(|p| text::normalize_page_text(p))
        .collect::<Vec<_>>()
        .join(" ");

    match text::context_around(&full_text, doctor, DIAGNOSTIC_CONTEXT_CHARS) {
        Some((index, context)) => {
            log::debug!("[{source}] Doctor name '{doctor}' found at index {index}");
            log::debug!("[{source}] Surrounding text: {context}");
        }
        None => log::debug!("[{source}] Doctor name '{doctor}' not found in the text"),
    }
}

/// Extracts records from an in-memory PDF.
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the PDF text cannot be extracted.
pub fn extract_document(
    bytes: &[u8],
    source: &str,
    options: &ExtractOptions,
) -> Result<ExtractedDocument, PdfError> {
    let pages = text::extract_pages(bytes)?;
    log::debug!("[{source}] Extracted text from {} pages", pages.len());
    Ok(extract_from_pages(&pages, source, options))
}

/// Reads a PDF file and extracts its records.
///
/// The file is read asynchronously and the CPU-bound extraction runs on
/// tokio's blocking pool.
///
/// # Errors
///
/// Returns [`PdfError::Io`] if the file cannot be read, or any error from
/// [`extract_document`].
pub async fn extract_file(
    path: &Path,
    options: &ExtractOptions,
) -> Result<ExtractedDocument, PdfError> {
    let bytes = tokio::fs::read(path).await?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let source = path.display().to_string();
    let options = options.clone();

    tokio::task::spawn_blocking(move || extract_document(&bytes, &source, &options)).await?
}

/// Extracts records from each file in turn.
///
/// Files are processed sequentially: one file, including all of its pages,
/// completes before the next begins. A file that fails is logged, recorded
/// in [`BatchExtraction::failures`], and skipped.
pub async fn extract_files(
    paths: &[PathBuf],
    options: &ExtractOptions,
    observer: &dyn BatchObserver,
) -> BatchExtraction {
    let mut batch = BatchExtraction::default();
    observer.batch_started(paths.len());

    log::info!(
        "Extracting schedules from {} PDF(s) using {} layout(s)",
        paths.len(),
        options.layouts.len()
    );

    for (i, path) in paths.iter().enumerate() {
        observer.file_started(i, path);

        let outcome = match extract_file(path, options).await {
            Ok(document) => {
                log::info!(
                    "PDF {}/{} {}: {} records from {} pages (total: {})",
                    i + 1,
                    paths.len(),
                    document.source,
                    document.records.len(),
                    document.page_count,
                    batch.records.len() + document.records.len()
                );
                let outcome = FileOutcome::Extracted {
                    pages: document.page_count,
                    records: document.records.len(),
                };
                batch.documents.push(DocumentSummary {
                    source: document.source,
                    page_count: document.page_count,
                    record_count: document.records.len(),
                });
                batch.records.extend(document.records);
                outcome
            }
            Err(error) => {
                log::error!("Error processing file {}: {error}", path.display());
                batch.failures.push(FileFailure {
                    path: path.clone(),
                    error,
                });
                FileOutcome::Failed
            }
        };

        observer.file_finished(path, outcome);
    }

    observer.batch_finished(batch.records.len(), batch.failures.len());

    batch
}

//! Command implementations shared by the subcommands and the interactive
//! flow.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::Utc;
use schedule_cli_utils::{FileProgressBar, MultiProgress};
use schedule_mock::{MockOptions, generate, parse_mock_date};
use schedule_models::{Appointment, Schedule};
use schedule_pdf::layout::LayoutRegistry;
use schedule_pdf::{ExtractOptions, extract_files};
use schedule_query::ScheduleFilter;
use schedule_report::{
    DEFAULT_TITLE, ReportError, render_report, report_file_name, write_report,
};

use crate::output;

/// Everything needed to run one extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    pub files: Vec<PathBuf>,
    pub doctor: Option<String>,
    /// Applied after extraction. The doctor is matched during extraction.
    pub filter: ScheduleFilter,
    pub layout_ids: Vec<String>,
    pub layout_files: Vec<PathBuf>,
    pub report: bool,
    pub json: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// Everything needed to generate one mock schedule.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub date: String,
    pub count: usize,
    pub seed: Option<u64>,
    pub json: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// Builds the layout registry with any user-supplied layout files
/// registered after the built-in layouts.
///
/// # Errors
///
/// Returns an error if a layout file cannot be read, parsed, or clashes
/// with an existing layout id.
pub fn load_registry(
    layout_files: &[PathBuf],
) -> Result<LayoutRegistry, Box<dyn std::error::Error>> {
    let mut registry = LayoutRegistry::builtin();
    for path in layout_files {
        registry.load_file(path)?;
        log::info!("Registered layout file {}", path.display());
    }
    Ok(registry)
}

/// Extracts records from the requested files, reporting skipped files and
/// per-document counts.
///
/// Prints the no-schedule hint and returns an empty schedule when nothing
/// was found.
///
/// # Errors
///
/// Returns an error if the layouts cannot be loaded.
pub async fn load_schedule(
    multi: &MultiProgress,
    request: &ExtractRequest,
) -> Result<Schedule, Box<dyn std::error::Error>> {
    let registry = load_registry(&request.layout_files)?;
    let layouts = registry.compile(&request.layout_ids)?;
    let options =
        ExtractOptions::new(layouts).with_doctor(request.doctor.as_deref().unwrap_or_default());

    let progress = FileProgressBar::new(multi);
    let batch = extract_files(&request.files, &options, &progress).await;

    for failure in &batch.failures {
        eprintln!("Skipped {}: {}", failure.path.display(), failure.error);
    }
    print!("{}", output::render_documents(&batch.documents));

    if batch.records.is_empty() {
        println!("{}", output::NO_SCHEDULE_HINT);
    }

    Ok(batch.records)
}

/// Applies `filter` to `records` and prints the result.
///
/// Returns the matching appointments.
pub fn show_filtered(records: &[Appointment], filter: &ScheduleFilter) -> Schedule {
    let appointments = filter.apply(records);
    if appointments.is_empty() {
        println!(
            "{} appointments were found, but none match the filters.",
            records.len()
        );
    } else {
        output::print_schedule(&appointments);
    }
    appointments
}

/// Extracts, filters, prints, and optionally exports a schedule.
///
/// Returns the filtered appointments.
///
/// # Errors
///
/// Returns an error if the layouts cannot be loaded or an export fails.
/// Unreadable PDFs are reported and skipped.
pub async fn extract(
    multi: &MultiProgress,
    request: &ExtractRequest,
) -> Result<Schedule, Box<dyn std::error::Error>> {
    let records = load_schedule(multi, request).await?;
    if records.is_empty() {
        return Ok(records);
    }

    let appointments = show_filtered(&records, &request.filter);

    if let Some(path) = &request.json {
        output::write_json(path, &appointments)?;
        println!("Saved JSON to {}", path.display());
    }

    if request.report {
        export_report(&appointments, request)?;
    }

    Ok(appointments)
}

/// Writes `appointments` as a PDF report into the request's output
/// directory. An empty list prints the no-data message instead.
///
/// # Errors
///
/// Returns an error if rendering or writing the report fails.
pub fn export_report(
    appointments: &[Appointment],
    request: &ExtractRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    match render_report(appointments, DEFAULT_TITLE) {
        Ok(bytes) => {
            let name = report_file_name(Utc::now(), request.doctor.as_deref());
            let path = write_report(&request.output_dir, &name, &bytes)?;
            println!("Saved report to {}", path.display());
            Ok(())
        }
        Err(ReportError::NoRecords) => {
            println!("{}", ReportError::NoRecords);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Generates a mock schedule, prints it, and writes it as a PDF report.
///
/// # Errors
///
/// Returns an error if the date is invalid or an export fails.
pub fn mock(request: &MockRequest) -> Result<Schedule, Box<dyn std::error::Error>> {
    let date = parse_mock_date(&request.date)?;
    let options = MockOptions {
        count: request.count,
        seed: request.seed,
        ..MockOptions::default()
    };

    let appointments = generate(date, &options);
    output::print_schedule(&appointments);

    if let Some(path) = &request.json {
        output::write_json(path, &appointments)?;
        println!("Saved JSON to {}", path.display());
    }

    let bytes = render_report(&appointments, DEFAULT_TITLE)?;
    let name = report_file_name(Utc::now(), None);
    let path = write_report(&request.output_dir, &name, &bytes)?;
    println!("Saved mock schedule to {}", path.display());

    Ok(appointments)
}

/// Prints every layout in `registry`.
pub fn print_layouts(registry: &LayoutRegistry) {
    print!("{}", layout_listing(registry));
}

fn layout_listing(registry: &LayoutRegistry) -> String {
    let mut out = format!("{:<12} NAME\n{}\n", "ID", "-".repeat(60));
    for layout in registry.iter() {
        let _ = writeln!(out, "{:<12} {}", layout.id, layout.name);
        let _ = writeln!(out, "{:<12} {}", "", layout.description);
    }
    out
}

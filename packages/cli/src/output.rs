//! Terminal rendering and output-path helpers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use schedule_models::{Appointment, COLUMNS};
use schedule_pdf::DocumentSummary;
use schedule_query::{ScheduleSummary, format_currency, summarize};

/// Report directory used when neither `--output-dir` nor
/// `SCHEDULE_OUTPUT_DIR` is set.
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Shown when extraction produced no records at all.
pub const NO_SCHEDULE_HINT: &str = "\
No schedule found. Please check:
  1. The doctor's name is spelled correctly.
  2. The PDF contains appointments in a supported layout (run `schedule_cli layouts`).
  3. The PDF is not encrypted or image-only.
Run with RUST_LOG=debug to see the extracted text around the doctor's name.";

/// Environment variable naming the report directory.
pub const OUTPUT_DIR_ENV: &str = "SCHEDULE_OUTPUT_DIR";

/// Resolves the report directory from `flag` and the process environment.
#[must_use]
pub fn output_dir(flag: Option<PathBuf>) -> PathBuf {
    resolve_output_dir(flag, std::env::var(OUTPUT_DIR_ENV).ok())
}

/// Picks the report directory: an explicit flag wins, then the environment
/// value, then [`DEFAULT_OUTPUT_DIR`].
#[must_use]
pub fn resolve_output_dir(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Renders appointments as a left-aligned text table with a header row.
#[must_use]
pub fn render_table(appointments: &[Appointment]) -> String {
    let mut widths = COLUMNS.map(str::len);
    for appointment in appointments {
        for (width, cell) in widths.iter_mut().zip(appointment.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &COLUMNS, &widths);
    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for appointment in appointments {
        push_row(&mut out, &appointment.cells(), &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[&str; 8], widths: &[usize; 8]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let _ = write!(line, "{cell:<width$}");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Renders the total pay line, the per-status counts, and a note for any
/// pay values left out of the total.
#[must_use]
pub fn render_summary(summary: &ScheduleSummary) -> String {
    let statuses = summary
        .by_status
        .iter()
        .map(|(status, count)| format!("{status}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = format!("Total Pay: {}\n", format_currency(summary.total_pay));
    if statuses.is_empty() {
        let _ = writeln!(out, "Appointments: {}", summary.count);
    } else {
        let _ = writeln!(out, "Appointments: {} ({statuses})", summary.count);
    }
    if summary.unparsed_pay > 0 {
        let _ = writeln!(
            out,
            "{} appointment(s) with unreadable pay are not in the total.",
            summary.unparsed_pay
        );
    }
    out
}

/// Prints the appointment table followed by the schedule summary.
pub fn print_schedule(appointments: &[Appointment]) {
    print!("{}", render_table(appointments));
    println!();
    print!("{}", render_summary(&summarize(appointments)));
}

/// Renders one line per processed document with its page and appointment
/// counts.
#[must_use]
pub fn render_documents(documents: &[DocumentSummary]) -> String {
    let mut out = String::new();
    for document in documents {
        let _ = writeln!(
            out,
            "Read {}: {} page(s), {} appointment(s)",
            document.source, document.page_count, document.record_count
        );
    }
    out
}

/// Writes appointments as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_json(
    path: &Path,
    appointments: &[Appointment],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(appointments)?;
    std::fs::write(path, json)?;
    log::info!(
        "Wrote {} appointments to {}",
        appointments.len(),
        path.display()
    );
    Ok(())
}

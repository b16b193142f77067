#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF report rendering for appointment schedules.
//!
//! Renders a schedule as an A4 table followed by a total-pay line, using the
//! built-in Helvetica fonts from [`printpdf`]. Each appointment is one row;
//! cells too wide for their column wrap onto extra lines, and the header is
//! repeated on continuation pages. Reports are saved under a
//! timestamp-derived file name from [`report_file_name`].

use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use schedule_models::{Appointment, COLUMNS};
use schedule_query::{format_currency, total_pay};

/// Title drawn at the top of exported reports.
pub const DEFAULT_TITLE: &str = "Filtered Schedule";

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const LAYER_NAME: &str = "Layer 1";

const LEFT_MM: f32 = 14.0;
const TITLE_Y_MM: f32 = 282.0;
const FIRST_HEADER_Y_MM: f32 = 272.0;
const CONTINUATION_HEADER_Y_MM: f32 = 282.0;
/// Rows never extend below this baseline, which leaves room for the total.
const BOTTOM_MARGIN_MM: f32 = 30.0;
/// Distance from one row's first line to the previous row's last line.
const ROW_HEIGHT_MM: f32 = 6.0;
/// Distance between wrapped lines inside one cell.
const WRAPPED_LINE_MM: f32 = 4.0;
const TOTAL_GAP_MM: f32 = 10.0;

const TITLE_FONT_SIZE: f32 = 14.0;
const CELL_FONT_SIZE: f32 = 9.0;
const TOTAL_FONT_SIZE: f32 = 11.0;

/// Width of each column in millimetres, in [`COLUMNS`] order.
const COLUMN_WIDTHS_MM: [f32; 8] = [23.0, 20.0, 28.0, 22.0, 30.0, 20.0, 18.0, 21.0];

/// Approximate Helvetica glyph width as a fraction of the font size.
const AVERAGE_GLYPH_EM: f32 = 0.5;
const MM_PER_POINT: f32 = 0.3528;

/// Errors that can occur while producing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// There are no records to render.
    #[error("No data to download after applying filters.")]
    NoRecords,

    /// The PDF library failed to build or serialize the document.
    #[error("PDF generation error: {0}")]
    Pdf(String),

    /// Writing the report to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[allow(clippy::cast_precision_loss)]
fn row_height(lines: usize) -> f32 {
    ROW_HEIGHT_MM + WRAPPED_LINE_MM * lines.saturating_sub(1) as f32
}

/// Splits body rows into per-page index ranges, given the number of text
/// lines each row needs.
///
/// A row is never split across pages. A row taller than a whole page gets
/// a page to itself.
#[must_use]
pub fn paginate(row_lines: &[usize]) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut available = FIRST_HEADER_Y_MM - BOTTOM_MARGIN_MM;
    let mut used = 0.0;

    for (i, &lines) in row_lines.iter().enumerate() {
        let height = row_height(lines);
        if i > start && used + height > available {
            pages.push(start..i);
            start = i;
            used = 0.0;
            available = CONTINUATION_HEADER_Y_MM - BOTTOM_MARGIN_MM;
        }
        used += height;
    }

    if start < row_lines.len() {
        pages.push(start..row_lines.len());
    }

    pages
}

/// Breaks `text` into lines that fit a column `width_mm` wide at
/// `font_size` points.
///
/// Lines break at whitespace. A single word wider than the column is split
/// across lines. Empty text yields one empty line.
#[must_use]
pub fn wrap_cell(text: &str, width_mm: f32, font_size: f32) -> Vec<String> {
    let glyph_mm = font_size * AVERAGE_GLYPH_EM * MM_PER_POINT;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = (((width_mm - 1.0) / glyph_mm).floor().max(1.0)) as usize;

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }

        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_chars).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                current = piece;
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

fn wrap_row(cells: &[&str; 8]) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(COLUMN_WIDTHS_MM)
        .map(|(cell, width)| wrap_cell(cell, width, CELL_FONT_SIZE))
        .collect()
}

fn line_count(row: &[Vec<String>]) -> usize {
    row.iter().map(Vec::len).max().unwrap_or(1)
}

/// Draws one row whose first line sits on `baseline_y`. Each cell's lines
/// are drawn together so the text layer reads cell by cell.
#[allow(clippy::cast_precision_loss)]
fn draw_row(
    layer: &PdfLayerReference,
    row: &[Vec<String>],
    baseline_y: f32,
    font: &IndirectFontRef,
) {
    let mut x = LEFT_MM;
    for (lines, width) in row.iter().zip(COLUMN_WIDTHS_MM) {
        for (i, line) in lines.iter().enumerate() {
            let y = baseline_y - WRAPPED_LINE_MM * i as f32;
            layer.use_text(line.as_str(), CELL_FONT_SIZE, Mm(x), Mm(y), font);
        }
        x += width;
    }
}

/// Renders `records` as a PDF table titled `title`, followed by the total
/// pay, and returns the PDF bytes.
///
/// Cells too wide for their column wrap onto extra lines, and the row
/// grows to fit.
///
/// # Errors
///
/// * [`ReportError::NoRecords`] if `records` is empty.
/// * [`ReportError::Pdf`] if the document cannot be built or serialized.
pub fn render_report(records: &[Appointment], title: &str) -> Result<Vec<u8>, ReportError> {
    if records.is_empty() {
        return Err(ReportError::NoRecords);
    }

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text(title, TITLE_FONT_SIZE, Mm(LEFT_MM), Mm(TITLE_Y_MM), &bold);

    let header = wrap_row(&COLUMNS);
    let rows: Vec<Vec<Vec<String>>> = records.iter().map(|r| wrap_row(&r.cells())).collect();
    let row_lines: Vec<usize> = rows.iter().map(|row| line_count(row)).collect();
    let pages = paginate(&row_lines);
    let mut cursor = FIRST_HEADER_Y_MM;

    for (page_index, page_rows) in pages.iter().enumerate() {
        let header_y = if page_index == 0 {
            FIRST_HEADER_Y_MM
        } else {
            let (page, page_layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
            layer = doc.get_page(page).get_layer(page_layer);
            CONTINUATION_HEADER_Y_MM
        };

        draw_row(&layer, &header, header_y, &bold);
        cursor = header_y;

        for row_index in page_rows.clone() {
            draw_row(&layer, &rows[row_index], cursor - ROW_HEIGHT_MM, &font);
            cursor -= row_height(row_lines[row_index]);
        }
    }

    let total = format!("Total Pay: {}", format_currency(total_pay(records)));
    layer.use_text(
        total,
        TOTAL_FONT_SIZE,
        Mm(LEFT_MM),
        Mm(cursor - TOTAL_GAP_MM),
        &bold,
    );

    log::debug!(
        "Rendered report '{title}' with {} rows on {} page(s)",
        records.len(),
        pages.len()
    );

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

/// Builds the report file name for a report generated at `now`:
/// `YYYY-MM-DD-HH-MM-SS.pdf`, prefixed with `<doctor>-` when a doctor name
/// is given.
#[must_use]
pub fn report_file_name(now: DateTime<Utc>, doctor: Option<&str>) -> String {
    let timestamp = now.format("%Y-%m-%d-%H-%M-%S");

    match doctor.map(str::trim).filter(|d| !d.is_empty()) {
        Some(doctor) => {
            let safe: String = doctor
                .chars()
                .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
                .collect();
            format!("{safe}-{timestamp}.pdf")
        }
        None => format!("{timestamp}.pdf"),
    }
}

/// Writes report bytes to `dir/file_name`, creating `dir` if needed, and
/// returns the written path.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the directory or file cannot be written.
pub fn write_report(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    log::info!("Report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use schedule_models::AppointmentStatus;

    use super::*;

    fn appt(patient: usize) -> Appointment {
        Appointment {
            date: "03/15/2024".to_owned(),
            time: "9:30 AM".to_owned(),
            doctor: "Dr. Smith".to_owned(),
            patient: format!("Patient {patient}"),
            service: "Checkup".to_owned(),
            duration: "30 min".to_owned(),
            pay: "$120".to_owned(),
            status: AppointmentStatus::Confirmed,
        }
    }

    #[test]
    fn empty_report_is_rejected() {
        assert!(matches!(
            render_report(&[], DEFAULT_TITLE),
            Err(ReportError::NoRecords)
        ));
    }

    #[test]
    fn renders_pdf_bytes() {
        let bytes = render_report(&[appt(1), appt(2)], DEFAULT_TITLE).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_multi_page_report() {
        let records: Vec<Appointment> = (0..100).map(appt).collect();
        let bytes = render_report(&records, DEFAULT_TITLE).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_report_with_long_cells() {
        let mut record = appt(1);
        record.service = "Comprehensive Cardiovascular Evaluation And Followup".to_owned();
        record.doctor = "Dr. Elizabeth Montgomery-Whitfield".to_owned();
        let records: Vec<Appointment> = (0..60).map(|_| record.clone()).collect();
        let bytes = render_report(&records, DEFAULT_TITLE).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn paginates_single_line_rows() {
        assert!(paginate(&[]).is_empty());
        assert_eq!(paginate(&[1; 5]), vec![0..5]);
        assert_eq!(paginate(&[1; 40]), vec![0..40]);
        assert_eq!(paginate(&[1; 41]), vec![0..40, 40..41]);

        let pages = paginate(&[1; 100]);
        assert_eq!(pages, vec![0..40, 40..82, 82..100]);
    }

    #[test]
    fn paginates_wrapped_rows_by_height() {
        // 6mm + 2 * 4mm = 14mm per row; 242mm fits 17 of them.
        let pages = paginate(&[3; 20]);
        assert_eq!(pages, vec![0..17, 17..20]);
    }

    #[test]
    fn oversized_row_gets_its_own_page() {
        assert_eq!(paginate(&[1, 100, 1]), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn rows_stay_above_bottom_margin() {
        let lines = [1, 4, 2, 7, 1, 3, 2, 2, 5, 1, 1, 6, 3, 2, 1, 4, 2, 3, 1, 2, 8, 1, 1, 2];
        let lines: Vec<usize> = lines.iter().cycle().take(200).copied().collect();

        for (page_index, page) in paginate(&lines).iter().enumerate() {
            let header_y = if page_index == 0 {
                FIRST_HEADER_Y_MM
            } else {
                CONTINUATION_HEADER_Y_MM
            };
            let used: f32 = lines[page.clone()].iter().map(|&n| row_height(n)).sum();
            assert!(header_y - used >= BOTTOM_MARGIN_MM, "page {page_index} overflows");
        }
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_cell("03/15/2024", 23.0, CELL_FONT_SIZE), vec!["03/15/2024"]);
        assert_eq!(wrap_cell("", 23.0, CELL_FONT_SIZE), vec![""]);
    }

    #[test]
    fn wrap_breaks_long_text_at_spaces_without_losing_words() {
        let text = "Comprehensive Cardiovascular Evaluation";
        let lines = wrap_cell(text, 30.0, CELL_FONT_SIZE);

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        assert!(lines.iter().all(|l| !l.ends_with("...")));
    }

    #[test]
    fn wrap_splits_words_wider_than_the_column() {
        let lines = wrap_cell("Supercalifragilisticexpialidocious", 20.0, CELL_FONT_SIZE);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "Supercalifragilisticexpialidocious");
    }

    #[test]
    fn file_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 5, 9).unwrap();
        assert_eq!(report_file_name(now, None), "2024-03-15-08-05-09.pdf");
        assert_eq!(report_file_name(now, Some("  ")), "2024-03-15-08-05-09.pdf");
    }

    #[test]
    fn file_name_is_prefixed_with_doctor() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 5, 9).unwrap();
        assert_eq!(
            report_file_name(now, Some("Dr. Smith")),
            "Dr. Smith-2024-03-15-08-05-09.pdf"
        );
        assert_eq!(
            report_file_name(now, Some("Dr. A/B")),
            "Dr. A_B-2024-03-15-08-05-09.pdf"
        );
    }

    #[test]
    fn writes_report_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let path = write_report(&out, "report.pdf", b"%PDF-1.3").unwrap();
        assert_eq!(path, out.join("report.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.3");
    }
}

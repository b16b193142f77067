//! Regex-based appointment row extraction from normalized page text.
//!
//! Every compiled layout is applied against the full page text. Matches
//! from different layouts can cover the same (or part of the same) row, so
//! candidates are resolved greedily: earliest start wins, then the longer
//! match, then the layout registered first. Any candidate overlapping an
//! accepted span is dropped as a duplicate or partial match.

use regex::Captures;
use schedule_models::{Appointment, RawAppointment};

use crate::layout::CompiledLayout;

/// A single accepted row match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMatch {
    /// Id of the layout that produced this match.
    pub layout: String,
    /// Byte offset of the match start within the page text.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// The parsed appointment.
    pub appointment: Appointment,
}

struct Candidate<'t> {
    layout_index: usize,
    start: usize,
    end: usize,
    caps: Captures<'t>,
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn to_raw<'t>(caps: &Captures<'t>) -> RawAppointment<'t> {
    RawAppointment {
        date: group(caps, "date"),
        time: group(caps, "time"),
        doctor: group(caps, "doctor"),
        patient: group(caps, "patient"),
        service: group(caps, "service"),
        duration: group(caps, "duration"),
        pay: group(caps, "pay"),
        status: group(caps, "status"),
    }
}

/// Finds every non-overlapping appointment row in `text`.
///
/// Matches are returned in text order. Rows whose captured status is not a
/// known [`schedule_models::AppointmentStatus`] are skipped.
#[must_use]
pub fn match_page(text: &str, layouts: &[CompiledLayout]) -> Vec<PageMatch> {
    let mut candidates: Vec<Candidate<'_>> = layouts
        .iter()
        .enumerate()
        .flat_map(|(layout_index, layout)| {
            layout.regex.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                Some(Candidate {
                    layout_index,
                    start: whole.start(),
                    end: whole.end(),
                    caps,
                })
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.layout_index.cmp(&b.layout_index))
    });

    let mut matches = Vec::new();
    let mut accepted_end = 0;

    for candidate in candidates {
        if candidate.start < accepted_end {
            log::trace!(
                "Dropping overlapping '{}' match at {}..{}",
                layouts[candidate.layout_index].id,
                candidate.start,
                candidate.end
            );
            continue;
        }

        let layout = &layouts[candidate.layout_index];
        match Appointment::try_from(to_raw(&candidate.caps)) {
            Ok(appointment) => {
                log::debug!(
                    "Matched ({}): {}",
                    layout.id,
                    &text[candidate.start..candidate.end]
                );
                accepted_end = candidate.end;
                matches.push(PageMatch {
                    layout: layout.id.clone(),
                    start: candidate.start,
                    end: candidate.end,
                    appointment,
                });
            }
            Err(e) => {
                log::debug!("Skipping '{}' match: {e}", layout.id);
            }
        }
    }

    matches
}

/// Extracts appointments from one page of normalized text.
///
/// When `doctor` is given, only rows for that doctor are kept (compared
/// ignoring case and whitespace).
#[must_use]
pub fn extract_page(
    text: &str,
    layouts: &[CompiledLayout],
    doctor: Option<&str>,
) -> Vec<Appointment> {
    match_page(text, layouts)
        .into_iter()
        .map(|m| m.appointment)
        .filter(|appt| doctor.is_none_or(|name| appt.is_for_doctor(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use schedule_models::AppointmentStatus;

    use super::*;
    use crate::layout::{LayoutRegistry, parse_layout_toml};

    fn builtin() -> Vec<CompiledLayout> {
        LayoutRegistry::builtin().compile(&[]).unwrap()
    }

    #[test]
    fn exact_compact_row_yields_one_record() {
        let text = "03/15/2024 9:30 AM Dr. Smith Patient 12 Checkup 30min $120 Confirmed";
        let records = extract_page(text, &builtin(), None);

        assert_eq!(records.len(), 1);
        let appt = &records[0];
        assert_eq!(appt.date, "03/15/2024");
        assert_eq!(appt.time, "9:30 AM");
        assert_eq!(appt.doctor, "Dr. Smith");
        assert_eq!(appt.patient, "Patient 12");
        assert_eq!(appt.service, "Checkup");
        assert_eq!(appt.duration, "30 min");
        assert_eq!(appt.pay, "$120");
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn compact_pay_sign_is_optional() {
        let text = "03/15/2024 10:00 PM Dr. Jones Patient 3 Consult 45min 200 pending";
        let records = extract_page(text, &builtin(), None);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pay, "$200");
        assert_eq!(records[0].status, AppointmentStatus::Pending);
    }

    #[test]
    fn delimited_row_with_multi_word_service() {
        let text = "3/15/24, 14:30, Dr. Jane Smith, Patient 4, Annual Physical, 45 min, $150, Pending";
        let matches = match_page(text, &builtin());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].layout, "delimited");
        let appt = &matches[0].appointment;
        assert_eq!(appt.date, "3/15/24");
        assert_eq!(appt.time, "14:30");
        assert_eq!(appt.doctor, "Dr. Jane Smith");
        assert_eq!(appt.service, "Annual Physical");
        assert_eq!(appt.duration, "45 min");
        assert_eq!(appt.pay, "$150");
    }

    fn delimited_doctor(doctor: &str) -> Vec<Appointment> {
        let text =
            format!("3/15/24, 14:30, {doctor}, Patient 4, Checkup, 45 min, $150, Pending");
        extract_page(&text, &builtin(), None)
    }

    #[test]
    fn delimited_row_with_three_word_doctor() {
        let records = delimited_doctor("Dr. Mary Ann Smith");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doctor, "Dr. Mary Ann Smith");
        assert_eq!(records[0].patient, "Patient 4");
    }

    #[test]
    fn delimited_row_with_hyphenated_doctor() {
        let records = delimited_doctor("Dr. Smith-Jones");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doctor, "Dr. Smith-Jones");
    }

    #[test]
    fn delimited_row_with_apostrophe_in_doctor() {
        let records = delimited_doctor("Dr. O'Brien");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doctor, "Dr. O'Brien");
    }

    #[test]
    fn doctor_name_stops_before_patient_without_delimiters() {
        let text = "3/15/24 14:30 Dr. Mary Ann Smith Patient 4 Checkup 45 min $150 Pending";
        let records = extract_page(text, &builtin(), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doctor, "Dr. Mary Ann Smith");
        assert_eq!(records[0].patient, "Patient 4");
    }

    #[test]
    fn iso_row_with_hyphenated_doctor() {
        let text = "2024-03-15 | 09:00 | Dr. Anne-Marie O'Neil | Patient 2 | Checkup | 30 min | $80 | Confirmed";
        let matches = match_page(text, &builtin());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].layout, "iso");
        assert_eq!(matches[0].appointment.doctor, "Dr. Anne-Marie O'Neil");
    }

    #[test]
    fn delimited_row_without_delimiters() {
        let text = "12.01.2023 08:15 Dr. Brown Patient 9 Vaccination 15 min $40 Cancelled";
        let matches = match_page(text, &builtin());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].layout, "delimited");
        assert_eq!(
            matches[0].appointment.status,
            AppointmentStatus::Cancelled
        );
    }

    #[test]
    fn iso_row_with_pipes() {
        let text = "2024-03-15 | 14:30 | Dr. Smith | Patient 7 | Flu Shot | 15 minutes | $45.00 | Cancelled";
        let matches = match_page(text, &builtin());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].layout, "iso");
        assert_eq!(matches[0].appointment.service, "Flu Shot");
        assert_eq!(matches[0].appointment.duration, "15 min");
        assert_eq!(matches[0].appointment.pay, "$45.00");
    }

    #[test]
    fn finds_multiple_rows_among_noise() {
        let text = "Weekly Schedule Page 1 \
            03/15/2024 9:30 AM Dr. Smith Patient 12 Checkup 30min $120 Confirmed \
            Notes: bring paperwork \
            03/16/2024 11:00 AM Dr. Jones Patient 13 Consult 60min $250 Pending \
            Total appointments: 2";
        let records = extract_page(text, &builtin(), None);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].patient, "Patient 12");
        assert_eq!(records[1].patient, "Patient 13");
    }

    #[test]
    fn non_matching_text_yields_nothing() {
        let text = "This page intentionally left blank. Call 555-1234 for help.";
        assert!(extract_page(text, &builtin(), None).is_empty());
    }

    #[test]
    fn unknown_status_is_skipped() {
        let pipe = parse_layout_toml(
            r#"
id = "pipe"
name = "Pipe separated"
pattern = '(?P<date>[^|]+)\|(?P<time>[^|]+)\|(?P<doctor>[^|]+)\|(?P<patient>[^|]+)\|(?P<service>[^|]+)\|(?P<duration>[^|]+)\|(?P<pay>[^|]+)\|(?P<status>\w+)'
"#,
        )
        .unwrap()
        .compile()
        .unwrap();

        let text = "2024-03-15|10:00|Dr. Smith|Patient 1|Checkup|30 min|$90|Rescheduled";
        assert!(extract_page(text, &[pipe], None).is_empty());
    }

    #[test]
    fn overlapping_matches_are_deduplicated() {
        // Matches the tail of a compact row starting at the doctor field.
        let partial = parse_layout_toml(
            r#"
id = "partial"
name = "Doctor-first rows"
case_insensitive = true
pattern = '(?P<doctor>Dr\.\s*[A-Za-z]+)\s+(?P<patient>Patient\s*\d+)\s+(?P<service>[A-Za-z]+)\s+(?P<duration>\d+\s*min)\s+(?P<pay>\$?\d+)\s+(?P<status>Confirmed|Pending|Cancelled)(?P<date>)(?P<time>)'
"#,
        )
        .unwrap()
        .compile()
        .unwrap();

        let mut layouts = builtin();
        layouts.push(partial);

        let text = "03/15/2024 9:30 AM Dr. Smith Patient 12 Checkup 30min $120 Confirmed";
        let matches = match_page(text, &layouts);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].layout, "compact");
        assert_eq!(matches[0].start, 0);
    }

    #[test]
    fn iso_row_wins_over_delimited_suffix_match() {
        // The delimited layout also matches from "24-03-15" onwards.
        let text = "2024-03-15, 14:30, Dr. Smith, Patient 7, Checkup, 30 min, $90, Confirmed";
        let matches = match_page(text, &builtin());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].layout, "iso");
        assert_eq!(matches[0].appointment.date, "2024-03-15");
    }

    #[test]
    fn same_row_repeated_yields_each_occurrence() {
        let row = "03/15/2024 9:30 AM Dr. Smith Patient 12 Checkup 30min $120 Confirmed";
        let text = format!("{row} {row}");
        assert_eq!(extract_page(&text, &builtin(), None).len(), 2);
    }

    #[test]
    fn filters_by_doctor() {
        let text = "03/15/2024 9:30 AM Dr. Smith Patient 12 Checkup 30min $120 Confirmed \
            03/15/2024 10:00 AM Dr. Jones Patient 13 Consult 30min $150 Confirmed";
        let records = extract_page(text, &builtin(), Some("dr. jones"));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doctor, "Dr. Jones");
    }
}

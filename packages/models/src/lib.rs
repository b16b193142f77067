#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Appointment record types shared across the schedule toolchain.
//!
//! Every text layout recognised by the extraction engine maps its captures
//! into the single canonical [`Appointment`] record defined here. Field text
//! is kept as it appeared in the source document (so reports reproduce it),
//! while the derived accessors ([`Appointment::parsed_date`],
//! [`Appointment::pay_amount`], [`Appointment::duration_minutes`]) parse it
//! on demand.

use std::str::FromStr as _;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Column headers, in display order, for tabular renderings of a schedule.
pub const COLUMNS: [&str; 8] = [
    "Date", "Time", "Doctor", "Patient", "Service", "Duration", "Pay", "Status",
];

/// An ordered list of appointments extracted from one or more documents.
pub type Schedule = Vec<Appointment>;

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("valid regex"));

static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})$").expect("valid regex")
});

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s*min").expect("valid regex"));

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)").expect("valid regex"));

/// Booking status of an appointment.
///
/// Parsing is ASCII case-insensitive, so `"confirmed"` and `"CONFIRMED"`
/// both yield [`AppointmentStatus::Confirmed`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum AppointmentStatus {
    /// The appointment is booked and confirmed.
    Confirmed,
    /// The appointment is awaiting confirmation.
    Pending,
    /// The appointment was cancelled.
    Cancelled,
}

impl AppointmentStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Confirmed, Self::Pending, Self::Cancelled]
    }
}

/// Error returned when a status string is not one of the known
/// [`AppointmentStatus`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatusError {
    /// The status text that failed to parse.
    pub value: String,
}

impl std::fmt::Display for InvalidStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid appointment status '{}': expected Confirmed, Pending or Cancelled",
            self.value
        )
    }
}

impl std::error::Error for InvalidStatusError {}

/// One parsed schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Appointment date as it appeared in the source (format varies by
    /// layout, e.g. `03/15/2024` or `2024-03-15`).
    pub date: String,
    /// Appointment time as it appeared in the source (e.g. `9:30 AM`).
    pub time: String,
    /// Doctor name (e.g. `Dr. Smith`).
    pub doctor: String,
    /// Patient identifier (e.g. `Patient 12`).
    pub patient: String,
    /// Service performed.
    pub service: String,
    /// Duration in the canonical `"<n> min"` form.
    pub duration: String,
    /// Pay in the canonical `"$<n>"` form.
    pub pay: String,
    /// Booking status.
    pub status: AppointmentStatus,
}

/// Borrowed field captures for a single appointment, before
/// canonicalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawAppointment<'a> {
    /// Raw date text.
    pub date: &'a str,
    /// Raw time text.
    pub time: &'a str,
    /// Raw doctor text.
    pub doctor: &'a str,
    /// Raw patient text.
    pub patient: &'a str,
    /// Raw service text.
    pub service: &'a str,
    /// Raw duration text (`30min`, `30 min`, ...).
    pub duration: &'a str,
    /// Raw pay text, with or without the leading `$`.
    pub pay: &'a str,
    /// Raw status text.
    pub status: &'a str,
}

impl TryFrom<RawAppointment<'_>> for Appointment {
    type Error = InvalidStatusError;

    fn try_from(raw: RawAppointment<'_>) -> Result<Self, Self::Error> {
        let status =
            AppointmentStatus::from_str(raw.status.trim()).map_err(|_| InvalidStatusError {
                value: raw.status.trim().to_owned(),
            })?;

        Ok(Self {
            date: raw.date.trim().to_owned(),
            time: collapse_whitespace(raw.time),
            doctor: collapse_whitespace(raw.doctor),
            patient: collapse_whitespace(raw.patient),
            service: collapse_whitespace(raw.service),
            duration: normalize_duration(raw.duration),
            pay: normalize_pay(raw.pay),
            status,
        })
    }
}

impl Appointment {
    /// Parses [`Self::date`] into a calendar date.
    ///
    /// Returns `None` if the date text is not in a recognised format.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_appointment_date(&self.date)
    }

    /// Parses the numeric value of [`Self::pay`].
    #[must_use]
    pub fn pay_amount(&self) -> Option<f64> {
        parse_pay_amount(&self.pay)
    }

    /// Parses the number of minutes in [`Self::duration`].
    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        DURATION_RE
            .captures(self.duration.trim())
            .and_then(|caps| caps[1].parse().ok())
    }

    /// Returns the record's fields in [`COLUMNS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 8] {
        [
            self.date.as_str(),
            self.time.as_str(),
            self.doctor.as_str(),
            self.patient.as_str(),
            self.service.as_str(),
            self.duration.as_str(),
            self.pay.as_str(),
            self.status.as_ref(),
        ]
    }

    /// Whether this appointment belongs to the doctor named `name`.
    #[must_use]
    pub fn is_for_doctor(&self, name: &str) -> bool {
        doctor_matches(&self.doctor, name)
    }
}

/// Parses an appointment date string.
///
/// Accepts month-first `MM/DD/YYYY` style dates with `/`, `.` or `-`
/// separators and two- or four-digit years (two-digit years map to
/// 2000-2099), as well as ISO `YYYY-MM-DD`.
#[must_use]
pub fn parse_appointment_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if ISO_DATE_RE.is_match(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }

    let caps = SLASH_DATE_RE.captures(s)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year_text = &caps[3];
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses the numeric prefix of a pay string.
///
/// A leading `$` and thousands separators are ignored, and trailing
/// non-numeric text is tolerated (`"$120.50 USD"` parses as `120.5`).
#[must_use]
pub fn parse_pay_amount(s: &str) -> Option<f64> {
    let cleaned = s.trim().trim_start_matches('$').trim().replace(',', "");
    let number = LEADING_NUMBER_RE.find(&cleaned)?;
    number
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Compares two doctor names ignoring case and whitespace, so that
/// `"Dr.Smith"` matches `"dr. smith"`.
#[must_use]
pub fn doctor_matches(candidate: &str, wanted: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    };
    let wanted = normalize(wanted);
    !wanted.is_empty() && normalize(candidate) == wanted
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_duration(s: &str) -> String {
    let trimmed = s.trim();
    DURATION_RE
        .captures(trimmed)
        .map_or_else(|| trimmed.to_owned(), |caps| format!("{} min", &caps[1]))
}

fn normalize_pay(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('$') {
        trimmed.to_owned()
    } else {
        format!("${trimmed}")
    }
}

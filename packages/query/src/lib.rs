#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering and aggregation over extracted appointment schedules.
//!
//! A [`ScheduleFilter`] combines optional date-range, status, and doctor
//! constraints conjunctively. Records whose date text cannot be parsed are
//! excluded whenever a date bound is active, rather than failing the
//! filter. [`total_pay`] and [`summarize`] aggregate a filtered schedule.

use std::collections::BTreeMap;
use std::str::FromStr as _;

use chrono::NaiveDate;
use schedule_models::{Appointment, AppointmentStatus, doctor_matches};
use serde::Serialize;

/// Errors produced when parsing user-entered filter values.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A date bound was not a valid `YYYY-MM-DD` date.
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A status was not one of the known appointment statuses.
    #[error("Invalid status '{0}': expected Confirmed, Pending or Cancelled")]
    InvalidStatus(String),
}

/// Conjunctive filter over appointments. Absent criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    /// Earliest appointment date to keep (inclusive).
    pub start: Option<NaiveDate>,
    /// Latest appointment date to keep (inclusive).
    pub end: Option<NaiveDate>,
    /// Only keep appointments with this status.
    pub status: Option<AppointmentStatus>,
    /// Only keep appointments for this doctor (ignoring case and
    /// whitespace).
    pub doctor: Option<String>,
}

impl ScheduleFilter {
    /// Builds a filter from raw user input, where an empty string means "no
    /// constraint".
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if a non-empty date or status is invalid.
    pub fn from_input(
        start: &str,
        end: &str,
        status: &str,
        doctor: &str,
    ) -> Result<Self, FilterError> {
        let doctor = doctor.trim();
        Ok(Self {
            start: parse_filter_date(start)?,
            end: parse_filter_date(end)?,
            status: parse_filter_status(status)?,
            doctor: (!doctor.is_empty()).then(|| doctor.to_owned()),
        })
    }

    /// Whether no criteria are set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.status.is_none() && self.doctor.is_none()
    }

    /// Whether `appointment` satisfies every active criterion.
    #[must_use]
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if self.start.is_some() || self.end.is_some() {
            let Some(date) = appointment.parsed_date() else {
                log::trace!(
                    "Excluding appointment with unparsable date '{}'",
                    appointment.date
                );
                return false;
            };
            if self.start.is_some_and(|start| date < start) {
                return false;
            }
            if self.end.is_some_and(|end| date > end) {
                return false;
            }
        }

        if self.status.is_some_and(|status| appointment.status != status) {
            return false;
        }

        if let Some(doctor) = &self.doctor
            && !doctor_matches(&appointment.doctor, doctor)
        {
            return false;
        }

        true
    }

    /// Returns the appointments satisfying the filter, preserving order.
    #[must_use]
    pub fn apply(&self, appointments: &[Appointment]) -> Vec<Appointment> {
        let filtered: Vec<Appointment> = appointments
            .iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect();

        log::debug!(
            "Filter {self:?} kept {} of {} appointments",
            filtered.len(),
            appointments.len()
        );

        filtered
    }
}

/// Parses a filter date bound in ISO `YYYY-MM-DD` form. Empty input means
/// no bound.
///
/// # Errors
///
/// Returns [`FilterError::InvalidDate`] if non-empty input is not a valid
/// date.
pub fn parse_filter_date(s: &str) -> Result<Option<NaiveDate>, FilterError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FilterError::InvalidDate(s.to_owned()))
}

/// Parses a filter status. Empty input means any status.
///
/// # Errors
///
/// Returns [`FilterError::InvalidStatus`] if non-empty input is not a known
/// status.
pub fn parse_filter_status(s: &str) -> Result<Option<AppointmentStatus>, FilterError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    AppointmentStatus::from_str(s)
        .map(Some)
        .map_err(|_| FilterError::InvalidStatus(s.to_owned()))
}

/// Sums the numeric pay of every appointment, ignoring entries whose pay
/// cannot be parsed.
#[must_use]
pub fn total_pay(appointments: &[Appointment]) -> f64 {
    appointments
        .iter()
        .filter_map(Appointment::pay_amount)
        .sum()
}

/// Formats an amount as dollars with two decimals (e.g. `$1234.50`).
#[must_use]
pub fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Aggregate figures for a schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSummary {
    /// Number of appointments.
    pub count: usize,
    /// Sum of parseable pay values.
    pub total_pay: f64,
    /// Number of appointments whose pay could not be parsed.
    pub unparsed_pay: usize,
    /// Appointment counts per status.
    pub by_status: BTreeMap<AppointmentStatus, usize>,
}

/// Computes a [`ScheduleSummary`] for `appointments`.
#[must_use]
pub fn summarize(appointments: &[Appointment]) -> ScheduleSummary {
    let mut by_status = BTreeMap::new();
    for appointment in appointments {
        *by_status.entry(appointment.status).or_insert(0) += 1;
    }

    ScheduleSummary {
        count: appointments.len(),
        total_pay: total_pay(appointments),
        unparsed_pay: appointments
            .iter()
            .filter(|a| a.pay_amount().is_none())
            .count(),
        by_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appt(date: &str, doctor: &str, pay: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            date: date.to_owned(),
            time: "9:00 AM".to_owned(),
            doctor: doctor.to_owned(),
            patient: "Patient 1".to_owned(),
            service: "Checkup".to_owned(),
            duration: "30 min".to_owned(),
            pay: pay.to_owned(),
            status,
        }
    }

    fn schedule() -> Vec<Appointment> {
        vec![
            appt("03/14/2024", "Dr. Smith", "$100", AppointmentStatus::Confirmed),
            appt("03/15/2024", "Dr. Smith", "$150", AppointmentStatus::Pending),
            appt("2024-03-16", "Dr. Jones", "$200", AppointmentStatus::Confirmed),
            appt("not a date", "Dr. Smith", "$n/a", AppointmentStatus::Cancelled),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = ScheduleFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&schedule()).len(), 4);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let filter = ScheduleFilter {
            start: date(2024, 3, 15),
            end: date(2024, 3, 16),
            ..Default::default()
        };
        let kept = filter.apply(&schedule());
        let dates: Vec<&str> = kept.iter().map(|a| a.date.as_str()).collect();
        assert_eq!(dates, vec!["03/15/2024", "2024-03-16"]);
    }

    #[test]
    fn invalid_dates_are_excluded_by_date_bounds() {
        let filter = ScheduleFilter {
            end: date(2030, 1, 1),
            ..Default::default()
        };
        let kept = filter.apply(&schedule());
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|a| a.date != "not a date"));
    }

    #[test]
    fn invalid_dates_pass_when_no_date_bound() {
        let filter = ScheduleFilter {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        let kept = filter.apply(&schedule());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, "not a date");
    }

    #[test]
    fn criteria_are_conjunctive() {
        let filter = ScheduleFilter {
            start: date(2024, 3, 14),
            end: date(2024, 3, 31),
            status: Some(AppointmentStatus::Confirmed),
            doctor: Some("dr. smith".to_owned()),
        };
        let kept = filter.apply(&schedule());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, "03/14/2024");
    }

    #[test]
    fn unsatisfiable_filter_returns_empty() {
        let filter = ScheduleFilter {
            status: Some(AppointmentStatus::Pending),
            doctor: Some("Dr. Jones".to_owned()),
            ..Default::default()
        };
        assert!(filter.apply(&schedule()).is_empty());
    }

    #[test]
    fn builds_filter_from_blank_input() {
        let filter = ScheduleFilter::from_input("", " ", "", "").unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn builds_filter_from_input() {
        let filter =
            ScheduleFilter::from_input("2024-03-01", "2024-03-31", "pending", " Dr. Smith ")
                .unwrap();
        assert_eq!(filter.start, date(2024, 3, 1));
        assert_eq!(filter.end, date(2024, 3, 31));
        assert_eq!(filter.status, Some(AppointmentStatus::Pending));
        assert_eq!(filter.doctor.as_deref(), Some("Dr. Smith"));
    }

    #[test]
    fn rejects_invalid_filter_input() {
        assert!(matches!(
            ScheduleFilter::from_input("03/01/2024", "", "", ""),
            Err(FilterError::InvalidDate(_))
        ));
        assert!(matches!(
            ScheduleFilter::from_input("", "", "Booked", ""),
            Err(FilterError::InvalidStatus(_))
        ));
    }

    #[test]
    fn total_pay_ignores_unparsable_entries() {
        let total = total_pay(&schedule());
        assert!((total - 450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_pay_of_empty_schedule_is_zero() {
        assert!(total_pay(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn formats_currency_with_two_decimals() {
        assert_eq!(format_currency(450.0), "$450.00");
        assert_eq!(format_currency(1234.5), "$1234.50");
    }

    #[test]
    fn summarizes_schedule() {
        let summary = summarize(&schedule());
        assert_eq!(summary.count, 4);
        assert_eq!(summary.unparsed_pay, 1);
        assert_eq!(summary.by_status[&AppointmentStatus::Confirmed], 2);
        assert_eq!(summary.by_status[&AppointmentStatus::Pending], 1);
        assert_eq!(summary.by_status[&AppointmentStatus::Cancelled], 1);
        assert!((summary.total_pay - 450.0).abs() < f64::EPSILON);
    }
}

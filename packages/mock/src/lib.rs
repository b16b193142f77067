#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Synthetic appointment schedule generation for demos and tests.
//!
//! Generated appointments use the same field formats as the `compact`
//! extraction layout (`03/15/2024 9:30 AM Dr. Smith Patient 1 Checkup
//! 30 min $120 Confirmed`), so a report rendered from mock data can be fed
//! straight back into the extractor.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};
use schedule_models::{Appointment, AppointmentStatus, parse_appointment_date};

/// Doctors assigned to generated appointments.
pub const DOCTORS: &[&str] = &["Dr. Smith", "Dr. Johnson", "Dr. Williams", "Dr. Brown"];

/// Services assigned to generated appointments.
pub const SERVICES: &[&str] = &[
    "Checkup",
    "Consultation",
    "Followup",
    "Vaccination",
    "Physical",
    "Screening",
];

/// Possible appointment lengths in minutes.
const DURATIONS_MIN: &[u32] = &[15, 30, 45, 60];

/// Pay is drawn in $5 steps between these bounds (inclusive).
const PAY_MIN: u32 = 50;
const PAY_MAX: u32 = 300;
const PAY_STEP: u32 = 5;

/// Errors produced by mock data generation.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// The requested schedule date could not be parsed.
    #[error("Please select a valid date (got '{0}')")]
    InvalidDate(String),
}

/// Options for [`generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockOptions {
    /// Number of appointments to generate.
    pub count: usize,
    /// Seed for reproducible output; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Time of the first appointment.
    pub day_start: NaiveTime,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            count: 10,
            seed: None,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Parses the user-supplied schedule date for mock generation.
///
/// Accepts ISO `YYYY-MM-DD` as well as the month-first forms understood by
/// [`parse_appointment_date`].
///
/// # Errors
///
/// Returns [`MockError::InvalidDate`] if the input is not a valid date.
pub fn parse_mock_date(s: &str) -> Result<NaiveDate, MockError> {
    parse_appointment_date(s).ok_or_else(|| MockError::InvalidDate(s.trim().to_owned()))
}

/// Generates `options.count` appointments on `date`.
///
/// Appointments are back to back starting at `options.day_start`, each one
/// beginning when the previous one ends (wrapping past midnight for very
/// large counts).
#[must_use]
pub fn generate(date: NaiveDate, options: &MockOptions) -> Vec<Appointment> {
    let mut rng = options
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let date_text = date.format("%m/%d/%Y").to_string();
    let mut time = options.day_start;
    let mut appointments = Vec::with_capacity(options.count);

    for i in 0..options.count {
        let duration = DURATIONS_MIN[rng.gen_range(0..DURATIONS_MIN.len())];
        let pay = rng.gen_range(PAY_MIN / PAY_STEP..=PAY_MAX / PAY_STEP) * PAY_STEP;
        let statuses = AppointmentStatus::all();

        appointments.push(Appointment {
            date: date_text.clone(),
            time: time.format("%-I:%M %p").to_string(),
            doctor: DOCTORS[rng.gen_range(0..DOCTORS.len())].to_owned(),
            patient: format!("Patient {}", i + 1),
            service: SERVICES[rng.gen_range(0..SERVICES.len())].to_owned(),
            duration: format!("{duration} min"),
            pay: format!("${pay}"),
            status: statuses[rng.gen_range(0..statuses.len())],
        });

        time += Duration::minutes(i64::from(duration));
    }

    log::info!(
        "Generated {} mock appointments for {date_text}",
        appointments.len()
    );

    appointments
}

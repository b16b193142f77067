//! Interactive terminal flow.
//!
//! Walks the user through picking PDF files and entering a doctor name,
//! then lets them try filters on the extracted schedule as many times as
//! they like before exporting a report, using `dialoguer` prompts.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dialoguer::{Confirm, Input, Select};
use schedule_cli_utils::MultiProgress;
use schedule_models::AppointmentStatus;
use schedule_query::{ScheduleFilter, parse_filter_date};

use crate::commands::{self, ExtractRequest, MockRequest};
use crate::output;

/// Top-level actions available in the interactive menu.
enum Action {
    Extract,
    Mock,
    ListLayouts,
}

impl Action {
    const ALL: &[Self] = &[Self::Extract, Self::Mock, Self::ListLayouts];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Extract => "Extract schedule from PDFs",
            Self::Mock => "Generate mock schedule",
            Self::ListLayouts => "List layouts",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Appointment Schedule Extractor");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let output_dir = output::output_dir(None);

    match Action::ALL[idx] {
        Action::Extract => run_extract(multi, output_dir).await?,
        Action::Mock => {
            let request = prompt_mock(output_dir)?;
            commands::mock(&request)?;
        }
        Action::ListLayouts => commands::print_layouts(&commands::load_registry(&[])?),
    }

    Ok(())
}

/// Extracts once, then filters the same records until the user is done.
async fn run_extract(
    multi: &MultiProgress,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = prompt_extract(output_dir)?;
    let records = commands::load_schedule(multi, &request).await?;
    if records.is_empty() {
        return Ok(());
    }

    let appointments = loop {
        let filter = prompt_filter()?;
        let appointments = commands::show_filtered(&records, &filter);

        let again = Confirm::new()
            .with_prompt("Apply different filters?")
            .default(false)
            .interact()?;
        if !again {
            break appointments;
        }
    };

    let report = Confirm::new()
        .with_prompt(format!(
            "Save a PDF report to {}?",
            request.output_dir.display()
        ))
        .default(true)
        .interact()?;
    if report {
        commands::export_report(&appointments, &request)?;
    }

    Ok(())
}

fn prompt_extract(output_dir: PathBuf) -> Result<ExtractRequest, Box<dyn std::error::Error>> {
    let files_str: String = Input::new()
        .with_prompt("PDF files (comma-separated)")
        .validate_with(|input: &String| -> Result<(), String> {
            let files = split_list(input);
            let missing: Vec<&str> = files
                .iter()
                .copied()
                .filter(|f| !Path::new(f).is_file())
                .collect();
            if files.is_empty() {
                Err("Please select at least one PDF file".to_owned())
            } else if missing.is_empty() {
                Ok(())
            } else {
                Err(format!("File not found: {}", missing.join(", ")))
            }
        })
        .interact_text()?;
    let files: Vec<PathBuf> = split_list(&files_str)
        .into_iter()
        .map(PathBuf::from)
        .collect();

    let doctor: String = Input::new()
        .with_prompt("Doctor's name (empty for all)")
        .allow_empty(true)
        .interact_text()?;

    let doctor = doctor.trim();

    Ok(ExtractRequest {
        files,
        doctor: (!doctor.is_empty()).then(|| doctor.to_owned()),
        output_dir,
        ..ExtractRequest::default()
    })
}

fn prompt_filter() -> Result<ScheduleFilter, Box<dyn std::error::Error>> {
    let start = prompt_date("Start date YYYY-MM-DD (empty for none)")?;
    let end = prompt_date("End date YYYY-MM-DD (empty for none)")?;
    let status = prompt_status()?;

    Ok(ScheduleFilter {
        start,
        end,
        status,
        doctor: None,
    })
}

fn prompt_mock(output_dir: PathBuf) -> Result<MockRequest, Box<dyn std::error::Error>> {
    let date: String = Input::new()
        .with_prompt("Schedule date (YYYY-MM-DD)")
        .validate_with(|input: &String| -> Result<(), String> {
            schedule_mock::parse_mock_date(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    let count_str: String = Input::new()
        .with_prompt("Number of appointments")
        .default("10".to_string())
        .validate_with(|input: &String| parse_count(input).map(|_| ()))
        .interact_text()?;
    let count = parse_count(&count_str)?;

    Ok(MockRequest {
        date,
        count,
        seed: None,
        json: None,
        output_dir,
    })
}

fn prompt_date(prompt: &str) -> Result<Option<NaiveDate>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            parse_filter_date(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;
    Ok(parse_filter_date(&input)?)
}

fn prompt_status() -> Result<Option<AppointmentStatus>, Box<dyn std::error::Error>> {
    let mut labels = vec!["Any".to_owned()];
    labels.extend(AppointmentStatus::all().iter().map(ToString::to_string));

    let idx = Select::new()
        .with_prompt("Status")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(idx
        .checked_sub(1)
        .and_then(|i| AppointmentStatus::all().get(i).copied()))
}

fn parse_count(input: &str) -> Result<usize, String> {
    match input.trim().parse::<usize>() {
        Ok(0) => Err("Enter at least one appointment".to_owned()),
        Ok(count) => Ok(count),
        Err(_) => Err(format!("Not a whole number: {}", input.trim())),
    }
}

/// Splits comma-separated user input into trimmed, non-empty entries.
fn split_list(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

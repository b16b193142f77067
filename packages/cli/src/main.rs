#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the appointment schedule toolchain.
//!
//! Extracts appointment records from PDF text layers, filters them, prints
//! a table with the total pay, and optionally exports a PDF report or JSON.
//! Run without a subcommand for a guided interactive flow.
//!
//! Uses `indicatif-log-bridge` (via [`schedule_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use schedule_query::ScheduleFilter;

use crate::commands::{ExtractRequest, MockRequest};

#[derive(Parser)]
#[command(
    name = "schedule_cli",
    about = "Appointment schedule extraction from PDF files"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract appointments from one or more PDF files
    Extract {
        /// PDF files to read, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Only keep appointments for this doctor (case and spacing are ignored)
        #[arg(long)]
        doctor: Option<String>,
        /// Earliest appointment date to keep (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: Option<String>,
        /// Latest appointment date to keep (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: Option<String>,
        /// Only keep appointments with this status (Confirmed, Pending, Cancelled)
        #[arg(long)]
        status: Option<String>,
        /// Layout id to match (repeatable). Defaults to every layout.
        #[arg(long = "layout")]
        layouts: Vec<String>,
        /// Additional layout TOML file to register (repeatable)
        #[arg(long = "layout-file")]
        layout_files: Vec<PathBuf>,
        /// Write a PDF report of the filtered appointments
        #[arg(long)]
        report: bool,
        /// Write the filtered appointments as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
        /// Directory for PDF reports (overrides `SCHEDULE_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Generate a mock schedule and write it as a PDF report
    Mock {
        /// Schedule date (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long)]
        date: String,
        /// Number of appointments to generate
        #[arg(long, default_value = "10")]
        count: usize,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Directory for PDF reports (overrides `SCHEDULE_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Also write the generated appointments as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// List the available text layouts
    Layouts {
        /// Additional layout TOML file to register (repeatable)
        #[arg(long = "layout-file")]
        layout_files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = schedule_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Extract {
            files,
            doctor,
            start,
            end,
            status,
            layouts,
            layout_files,
            report,
            json,
            output_dir,
        } => {
            let filter = ScheduleFilter::from_input(
                start.as_deref().unwrap_or_default(),
                end.as_deref().unwrap_or_default(),
                status.as_deref().unwrap_or_default(),
                "",
            )?;

            let request = ExtractRequest {
                files,
                doctor,
                filter,
                layout_ids: layouts,
                layout_files,
                report,
                json,
                output_dir: output::output_dir(output_dir),
            };
            commands::extract(&multi, &request).await?;
        }
        Commands::Mock {
            date,
            count,
            seed,
            output_dir,
            json,
        } => {
            let request = MockRequest {
                date,
                count,
                seed,
                json,
                output_dir: output::output_dir(output_dir),
            };
            commands::mock(&request)?;
        }
        Commands::Layouts { layout_files } => {
            commands::print_layouts(&commands::load_registry(&layout_files)?);
        }
    }

    Ok(())
}

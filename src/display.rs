//! Terminal summary for finished reports.
//!
//! Report files are written by the projector; this module only prints a short
//! human-readable confirmation, optionally with the heaviest jobs listed.

use crate::models::{total_memory, JobRecord};
use colored::Colorize;
use std::path::Path;

pub struct DisplayManager;

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    /// `records` is expected in sorted order.
    pub fn print_summary(&self, records: &[JobRecord], output_path: &Path, top: Option<usize>) {

        println!(
            "{} Completed, data output to: {}, total jobs: {} ({} total)",
            "✔".bright_green(),
            output_path.display().to_string().bright_white().bold(),
            records.len().to_string().bright_white().bold(),
            format_kilobytes(total_memory(records)).bright_yellow()
        );

        let Some(top) = top else {
            return;
        };
        if records.is_empty() || top == 0 {
            return;
        }

        println!("\n{}", "=".repeat(72).bright_cyan());
        println!(
            "{:<14} {:>12} {:>10}  {:<20} {}",
            "JobID".bold(),
            "Memory".bold(),
            "Elapsed".bold(),
            "Type".bold(),
            "State".bold()
        );
        println!("{}", "=".repeat(72).bright_cyan());

        for record in records.iter().take(top) {
            println!(
                "{:<14} {:>12} {:>10}  {:<20} {}",
                record.id,
                format_kilobytes(record.memory).bright_yellow(),
                format!("{}s", record.elapsed),
                record.job_type,
                colorize_state(&record.state)
            );
        }
    }
}

fn colorize_state(state: &str) -> colored::ColoredString {
    if state.starts_with("COMPLETED") {
        state.green()
    } else if state.starts_with("FAILED") || state.starts_with("OUT_OF_ME") {
        state.red()
    } else {
        state.normal()
    }
}

/// Human readable size for a kilobyte count.
pub fn format_kilobytes(kilobytes: u64) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];
    let mut value = kilobytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}K", kilobytes)
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}

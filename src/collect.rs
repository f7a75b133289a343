//! Accounting export collection.
//!
//! `sacct` misbehaves on very wide time ranges, so a date range is partitioned
//! into windows of at most `span_days` days and queried one window at a time.
//! Each window's output is appended to the same cache file, which the
//! reconciler later reads in one pass.

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const STANDARD_FIELDS: &[&str] = &[
    "JobIDRaw",
    "JobName",
    "Comment",
    "MaxRSS",
    "ElapsedRaw",
    "NodeList",
    "End",
    "State",
];

const EXTENDED_FIELDS: &[&str] = &["ExitCode", "User"];

/// Inclusive date range handed to one `sacct` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", value))
}

/// Split `[start, end]` into consecutive windows of `span_days` days.
///
/// The last window is clipped to `end`.
pub fn date_windows(start: NaiveDate, end: NaiveDate, span_days: u32) -> Result<Vec<DateWindow>> {
    if span_days == 0 {
        bail!("Window span must be at least one day");
    }
    if end < start {
        bail!("End date {} is before start date {}", end, start);
    }

    let span = Duration::days(i64::from(span_days));
    let mut windows = Vec::new();
    let mut current = start;

    while current <= end {
        let window_end = (current + span - Duration::days(1)).min(end);
        windows.push(DateWindow {
            start: current,
            end: window_end,
        });
        current += span;
    }

    Ok(windows)
}

/// Argument builder for `sacct` queries.
#[derive(Debug, Clone)]
pub struct SacctQuery {
    pub program: String,
    pub extended: bool,
}

impl Default for SacctQuery {
    fn default() -> Self {
        Self {
            program: "sacct".to_string(),
            extended: false,
        }
    }
}

impl SacctQuery {
    pub fn new(program: impl Into<String>, extended: bool) -> Self {
        Self {
            program: program.into(),
            extended,
        }
    }

    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = STANDARD_FIELDS.to_vec();
        if self.extended {
            fields.extend_from_slice(EXTENDED_FIELDS);
        }
        fields
    }

    pub fn args(&self, window: &DateWindow) -> Vec<String> {
        vec![
            "-a".to_string(),
            "--parsable2".to_string(),
            "--noheader".to_string(),
            "-D".to_string(),
            "--units=K".to_string(),
            "-o".to_string(),
            self.fields().join(","),
            format!("--starttime={}", window.start.format(DATE_FORMAT)),
            format!("--endtime={}", window.end.format(DATE_FORMAT)),
        ]
    }
}

/// Run the query for every window and append its output to `destination`.
///
/// Returns the number of bytes appended.
pub fn collect(query: &SacctQuery, windows: &[DateWindow], destination: &Path) -> Result<u64> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)
        .with_context(|| format!("Failed to open cache file: {}", destination.display()))?;

    let mut total = 0u64;
    for window in windows {
        info!(start = %window.start, end = %window.end, "Collecting accounting window");

        let output = Command::new(&query.program)
            .args(query.args(window))
            .output()
            .with_context(|| format!("Failed to run {}", query.program))?;

        if !output.status.success() {
            bail!(
                "{} failed for {}..{} ({}): {}",
                query.program,
                window.start,
                window.end,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        file.write_all(&output.stdout)
            .with_context(|| format!("Failed to append to {}", destination.display()))?;
        total += output.stdout.len() as u64;
        debug!(bytes = output.stdout.len(), "Window appended");
    }

    file.flush()?;
    Ok(total)
}

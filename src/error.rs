use std::io;

use thiserror::Error;

/// Fatal problems with an accounting export.
///
/// Partial exports are never tolerated: a dropped line would silently change
/// the memory totals downstream.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: job '{job_id}' has no step line (input ended mid-pair)")]
    TruncatedPair { line: usize, job_id: String },
    #[error("line {line}: invalid {field} value '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Failures while writing or re-reading rendered output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("document encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("table encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

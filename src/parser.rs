//! Field splitting and normalization for `sacct --parsable2` lines.
//!
//! Fields are positional: `JobIDRaw|JobName|Comment|MaxRSS|ElapsedRaw|NodeList|End|State`,
//! optionally followed by `ExitCode|User` in extended exports.

use crate::error::ReconcileError;

pub const DELIMITER: char = '|';

pub const ID: usize = 0;
pub const NAME: usize = 1;
pub const COMMENT: usize = 2;
pub const MEMORY: usize = 3;
pub const ELAPSED: usize = 4;
pub const NODE: usize = 5;
pub const END: usize = 6;
pub const STATE: usize = 7;
pub const EXIT_CODE: usize = 8;
pub const USER: usize = 9;

/// Fields a job line must carry.
pub const JOB_LINE_FIELDS: usize = STATE + 1;
/// Fields a step line must carry; only its memory column is read.
pub const STEP_LINE_FIELDS: usize = MEMORY + 1;

/// One export line split into its positional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based position in the input.
    pub line: usize,
    fields: Vec<String>,
}

impl RawLine {
    pub fn parse(text: &str, line: usize) -> Self {
        let text = text.trim_end_matches(['\r', '\n']);
        Self {
            line,
            fields: text.split(DELIMITER).map(str::to_string).collect(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].trim().is_empty()
    }

    pub fn require_fields(&self, expected: usize) -> Result<(), ReconcileError> {
        if self.fields.len() < expected {
            return Err(ReconcileError::FieldCount {
                line: self.line,
                expected,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    /// Field at `index`, or "" when the line is shorter.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    /// Job id with surrounding whitespace removed; blank ids come back empty.
    pub fn id(&self) -> &str {
        self.field(ID).trim()
    }

    pub fn name(&self) -> &str {
        self.field(NAME)
    }

    pub fn comment(&self) -> &str {
        self.field(COMMENT)
    }

    pub fn memory_raw(&self) -> &str {
        self.field(MEMORY)
    }

    pub fn elapsed_raw(&self) -> &str {
        self.field(ELAPSED)
    }

    pub fn node(&self) -> &str {
        self.field(NODE)
    }

    pub fn end(&self) -> &str {
        self.field(END)
    }

    pub fn state(&self) -> &str {
        self.field(STATE)
    }

    pub fn exit_code(&self) -> Option<&str> {
        self.fields.get(EXIT_CODE).map(String::as_str)
    }

    pub fn user(&self) -> Option<&str> {
        self.fields.get(USER).map(String::as_str)
    }
}

/// Split a job id into its base id and sub-unit suffix (`"100.batch"` -> `("100", Some("batch"))`).
pub fn split_job_id(id: &str) -> (&str, Option<&str>) {
    match id.split_once('.') {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (id, None),
    }
}

/// Convert a `MaxRSS` value to kilobytes.
///
/// Empty means the step recorded nothing and counts as zero. A trailing `K` is
/// dropped; `M`, `G` and `T` are scaled into kilobytes.
pub fn normalize_memory(raw: &str, line: usize) -> Result<u64, ReconcileError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }

    let invalid = || ReconcileError::InvalidField {
        line,
        field: "memory",
        value: raw.to_string(),
    };

    let (number, scale) = match raw.char_indices().last() {
        Some((at, unit)) if unit.is_ascii_alphabetic() => {
            let scale: u64 = match unit.to_ascii_uppercase() {
                'K' => 1,
                'M' => 1024,
                'G' => 1024 * 1024,
                'T' => 1024 * 1024 * 1024,
                _ => return Err(invalid()),
            };
            (&raw[..at], scale)
        }
        _ => (raw, 1),
    };

    if number.is_empty() {
        return Err(invalid());
    }

    if number.bytes().all(|b| b.is_ascii_digit()) {
        let value: u64 = number.parse().map_err(|_| invalid())?;
        return value.checked_mul(scale).ok_or_else(invalid);
    }

    // sacct prints fractional values for the larger units, e.g. "1.50M"
    if scale == 1 || !is_plain_decimal(number) {
        return Err(invalid());
    }
    let kilobytes = number.parse::<f64>().map_err(|_| invalid())? * scale as f64;
    if kilobytes.round() >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(kilobytes.round() as u64)
}

/// `digits.digits`, nothing else.
fn is_plain_decimal(number: &str) -> bool {
    match number.split_once('.') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && fraction.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Convert an `ElapsedRaw` value to seconds; empty counts as zero.
pub fn normalize_elapsed(raw: &str, line: usize) -> Result<u64, ReconcileError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u64>().map_err(|_| ReconcileError::InvalidField {
        line,
        field: "elapsed",
        value: raw.to_string(),
    })
}

//! Job/step line pairing.
//!
//! `sacct` prints each job line immediately followed by its step line. [`PairedLines`]
//! walks the export with an explicit cursor and yields one [`RawPair`] per
//! qualifying job line. A job line the predicate rejects is skipped on its own:
//! the line after it is treated as the next job line, not as its step.
//!
//! The iterator is lazy, finite and not restartable. It stops after the first
//! error.

use crate::error::ReconcileError;
use crate::parser::{RawLine, JOB_LINE_FIELDS, STEP_LINE_FIELDS};
use tracing::trace;

/// A job line and the step line that carries its measured usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    pub job: RawLine,
    pub step: RawLine,
}

pub struct PairedLines<I, F> {
    lines: I,
    cursor: usize,
    skipped: usize,
    qualifies: F,
    finished: bool,
}

impl<I, S, F> PairedLines<I, F>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&RawLine) -> bool,
{
    pub fn new<L>(lines: L, qualifies: F) -> Self
    where
        L: IntoIterator<IntoIter = I>,
    {
        Self {
            lines: lines.into_iter(),
            cursor: 0,
            skipped: 0,
            qualifies,
            finished: false,
        }
    }

    /// Number of input lines pulled so far.
    pub fn lines_consumed(&self) -> usize {
        self.cursor
    }

    /// Number of job lines rejected by the predicate.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_line(&mut self) -> Option<RawLine> {
        let text = self.lines.next()?;
        self.cursor += 1;
        Some(RawLine::parse(text.as_ref(), self.cursor))
    }

    fn fail(&mut self, error: ReconcileError) -> Option<Result<RawPair, ReconcileError>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<I, S, F> Iterator for PairedLines<I, F>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&RawLine) -> bool,
{
    type Item = Result<RawPair, ReconcileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let Some(job) = self.next_line() else {
                self.finished = true;
                return None;
            };

            if job.is_blank() {
                continue;
            }
            if let Err(e) = job.require_fields(JOB_LINE_FIELDS) {
                return self.fail(e);
            }
            if !(self.qualifies)(&job) {
                self.skipped += 1;
                trace!(line = job.line, job_id = job.id(), "Job line does not qualify, not pairing");
                continue;
            }

            let Some(step) = self.next_line() else {
                return self.fail(ReconcileError::TruncatedPair {
                    line: job.line,
                    job_id: job.id().to_string(),
                });
            };
            if let Err(e) = step.require_fields(STEP_LINE_FIELDS) {
                return self.fail(e);
            }

            return Some(Ok(RawPair { job, step }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = "100|sim|fre/ocean_run123|0|3600|node01|2023-02-01|COMPLETED";
    const STEP: &str = "100.batch|batch||512K|3600|node01|2023-02-01|COMPLETED";

    #[test]
    fn test_pairs_adjacent_lines() {
        let mut pairs = PairedLines::new(vec![JOB, STEP], |_: &RawLine| true);
        let pair = pairs.next().unwrap().unwrap();
        assert_eq!(pair.job.id(), "100");
        assert_eq!(pair.step.id(), "100.batch");
        assert_eq!(pair.step.line, 2);
        assert!(pairs.next().is_none());
        assert_eq!(pairs.lines_consumed(), 2);
    }

    #[test]
    fn test_rejected_job_line_consumes_one_line() {
        let lines = vec!["1|x|other|0|1|n|e|COMPLETED", JOB, STEP];
        let mut pairs = PairedLines::new(lines, |raw: &RawLine| raw.comment().contains("fre/"));

        let pair = pairs.next().unwrap().unwrap();
        assert_eq!(pair.job.line, 2);
        assert_eq!(pair.step.line, 3);
        assert_eq!(pairs.skipped(), 1);
    }

    #[test]
    fn test_truncated_pair_is_an_error() {
        let mut pairs = PairedLines::new(vec![JOB], |_: &RawLine| true);
        match pairs.next() {
            Some(Err(ReconcileError::TruncatedPair { line, job_id })) => {
                assert_eq!(line, 1);
                assert_eq!(job_id, "100");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(pairs.next().is_none());
    }

    #[test]
    fn test_short_step_line_is_an_error() {
        let mut pairs = PairedLines::new(vec![JOB, "100.batch|batch"], |_: &RawLine| true);
        assert!(matches!(
            pairs.next(),
            Some(Err(ReconcileError::FieldCount { line: 2, .. }))
        ));
    }

    #[test]
    fn test_blank_lines_between_pairs_are_ignored() {
        let lines = vec!["", JOB, STEP, "   "];
        let pairs: Vec<_> = PairedLines::new(lines, |_: &RawLine| true).collect();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].is_ok());
    }
}

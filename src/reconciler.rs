//! Record Reconciler
//!
//! Turns a `sacct` export into a [`JobMap`] of reconciled [`JobRecord`]s.
//!
//! ## Processing Pipeline
//!
//! 1. **Pairing**: [`PairedLines`] yields each qualifying job line together with
//!    the step line right after it. Job lines whose comment lacks the required
//!    substring are skipped without consuming a step line.
//! 2. **Normalization**: memory comes from the step line (the job line's own
//!    `MaxRSS` is empty or meaningless), elapsed time from the job line; empty
//!    values count as zero.
//! 3. **Threshold**: records below `min_memory` are dropped.
//! 4. **Classification**: the [`Classifier`] derives the `Type` column.
//! 5. **Insert or fold**: plain ids are inserted (last write wins). Ids with a
//!    sub-unit suffix such as `100.extern` never become keys; their memory
//!    overwrites the memory of the base record `100` instead.
//!
//! Any structural problem in the export aborts the whole run.

use crate::classify::Classifier;
use crate::error::ReconcileError;
use crate::models::{Filters, JobMap, JobRecord};
use crate::pairs::{PairedLines, RawPair};
use crate::parser::{normalize_elapsed, normalize_memory, split_job_id, RawLine};
use tracing::{debug, info, warn};

/// Counters collected during one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub pairs: usize,
    pub skipped_lines: usize,
    pub below_threshold: usize,
    pub folded: usize,
    pub orphan_folds: usize,
    pub empty_ids: usize,
}

/// Reconcile an export with the given filters and classification rules.
pub fn reconcile<L, S>(
    lines: L,
    filters: &Filters,
    classifier: &Classifier,
) -> Result<JobMap, ReconcileError>
where
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    reconcile_with_stats(lines, filters, classifier).map(|(jobs, _)| jobs)
}

pub fn reconcile_with_stats<L, S>(
    lines: L,
    filters: &Filters,
    classifier: &Classifier,
) -> Result<(JobMap, ReconcileStats), ReconcileError>
where
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut jobs = JobMap::new();
    let mut stats = ReconcileStats::default();

    let mut pairs = PairedLines::new(lines, |job: &RawLine| filters.accepts_comment(job.comment()));

    for pair in pairs.by_ref() {
        let pair = pair?;
        stats.pairs += 1;

        let record = build_record(&pair, classifier)?;

        if record.id.is_empty() {
            stats.empty_ids += 1;
            warn!(line = pair.job.line, "Discarding job line with an empty id");
            continue;
        }

        if !filters.accepts_memory(record.memory) {
            stats.below_threshold += 1;
            debug!(
                job_id = %record.id,
                memory = record.memory,
                min_memory = ?filters.min_memory,
                "Job below memory threshold"
            );
            continue;
        }

        match split_job_id(&record.id) {
            (base, Some(suffix)) => match jobs.get_mut(base) {
                Some(existing) => {
                    debug!(
                        base_id = base,
                        suffix,
                        memory = record.memory,
                        "Folding sub-unit memory into base job"
                    );
                    existing.memory = record.memory;
                    stats.folded += 1;
                }
                None => {
                    debug!(job_id = %record.id, "No base job to fold into, dropping");
                    stats.orphan_folds += 1;
                }
            },
            (_, None) => jobs.insert(record),
        }
    }

    stats.skipped_lines = pairs.skipped();

    info!(
        lines = pairs.lines_consumed(),
        jobs = jobs.len(),
        pairs = stats.pairs,
        skipped = stats.skipped_lines,
        below_threshold = stats.below_threshold,
        folded = stats.folded,
        "Reconciliation complete"
    );

    Ok((jobs, stats))
}

fn build_record(pair: &RawPair, classifier: &Classifier) -> Result<JobRecord, ReconcileError> {
    let job = &pair.job;
    let memory = normalize_memory(pair.step.memory_raw(), pair.step.line)?;
    let elapsed = normalize_elapsed(job.elapsed_raw(), job.line)?;

    Ok(JobRecord {
        id: job.id().to_string(),
        name: job.name().to_string(),
        comment: job.comment().to_string(),
        memory,
        elapsed,
        node: job.node().to_string(),
        end: job.end().to_string(),
        state: job.state().to_string(),
        job_type: classifier.classify(job.name(), job.comment()),
        exit_code: job.exit_code().map(str::to_string),
        user: job.user().map(str::to_string),
    })
}

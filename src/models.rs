//! Core Data Models
//!
//! This module defines the data structures that flow through the reconciliation
//! pipeline, from the filters handed to the reconciler to the records handed to
//! the projector.
//!
//! ## Data Flow
//!
//! 1. **Input**: raw `sacct` lines, parsed into [`crate::parser::RawLine`]
//! 2. **Filtering**: [`Filters`] decides which job lines qualify
//! 3. **Reconciliation**: each accepted job/step pair becomes a [`JobRecord`]
//!    stored in a [`JobMap`]
//! 4. **Output**: the projector sorts the map into a `Vec<JobRecord>` and renders it
//!
//! ## Field Names
//!
//! The serialized attribute names (`JobName`, `Comment`, `Memory`, ...) are kept
//! from the historical reports so existing downstream consumers keep working.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One reconciled job.
///
/// `id` is not serialized as an attribute: documents are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "JobName")]
    pub name: String,
    #[serde(rename = "Comment")]
    pub comment: String,
    /// Peak resident memory in kilobytes, taken from the step line.
    #[serde(rename = "Memory")]
    pub memory: u64,
    /// Elapsed wall time in seconds.
    #[serde(rename = "Elapsed")]
    pub elapsed: u64,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "End")]
    pub end: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Type")]
    pub job_type: String,
    #[serde(rename = "ExitCode", default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<String>,
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Summed memory of `records` in kilobytes, saturating at `u64::MAX`.
pub fn total_memory<'a>(records: impl IntoIterator<Item = &'a JobRecord>) -> u64 {
    records
        .into_iter()
        .fold(0u64, |total, record| total.saturating_add(record.memory))
}

/// Inclusion filters applied while reconciling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Job lines whose comment lacks this substring are skipped.
    pub required_substring: Option<String>,
    /// Records with memory strictly below this many kilobytes are discarded.
    pub min_memory: Option<u64>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required_substring(mut self, substring: impl Into<String>) -> Self {
        self.required_substring = Some(substring.into());
        self
    }

    pub fn with_min_memory(mut self, min_memory: u64) -> Self {
        self.min_memory = Some(min_memory);
        self
    }

    /// Whether a job line with this comment should be paired at all.
    pub fn accepts_comment(&self, comment: &str) -> bool {
        match &self.required_substring {
            Some(required) => comment.contains(required.as_str()),
            None => true,
        }
    }

    /// Whether a reconciled memory value clears the threshold.
    pub fn accepts_memory(&self, memory: u64) -> bool {
        match self.min_memory {
            Some(min) => memory >= min,
            None => true,
        }
    }
}

/// Insertion-ordered map of job id to record.
///
/// Inserting an id that is already present replaces the record but keeps the
/// position where the id was first seen.
#[derive(Debug, Clone, Default)]
pub struct JobMap {
    records: Vec<JobRecord>,
    index: HashMap<String, usize>,
}

impl JobMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: JobRecord) {
        match self.index.get(&record.id) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut JobRecord> {
        match self.index.get(id) {
            Some(&slot) => Some(&mut self.records[slot]),
            None => None,
        }
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.id.as_str())
    }

    pub fn into_records(self) -> Vec<JobRecord> {
        self.records
    }
}

impl IntoIterator for JobMap {
    type Item = JobRecord;
    type IntoIter = std::vec::IntoIter<JobRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, memory: u64) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            name: "sim".to_string(),
            comment: String::new(),
            memory,
            elapsed: 0,
            node: String::new(),
            end: String::new(),
            state: "COMPLETED".to_string(),
            job_type: String::new(),
            exit_code: None,
            user: None,
        }
    }

    #[test]
    fn test_insert_keeps_first_position_on_overwrite() {
        let mut map = JobMap::new();
        map.insert(record("1", 10));
        map.insert(record("2", 20));
        map.insert(record("1", 30));

        let ids: Vec<&str> = map.ids().collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(map.get("1").unwrap().memory, 30);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_total_memory_saturates() {
        let records = vec![record("1", 10), record("2", 20)];
        assert_eq!(total_memory(&records), 30);

        let huge = vec![record("1", u64::MAX), record("2", u64::MAX)];
        assert_eq!(total_memory(&huge), u64::MAX);
    }

    #[test]
    fn test_filters_default_accepts_everything() {
        let filters = Filters::new();
        assert!(filters.accepts_comment(""));
        assert!(filters.accepts_memory(0));
    }

    #[test]
    fn test_filters_thresholds() {
        let filters = Filters::new()
            .with_required_substring("fre/")
            .with_min_memory(100);
        assert!(filters.accepts_comment("fre/ocean"));
        assert!(!filters.accepts_comment("interactive"));
        assert!(filters.accepts_memory(100));
        assert!(!filters.accepts_memory(99));
    }
}

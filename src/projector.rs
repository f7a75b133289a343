//! Result Projector
//!
//! Orders reconciled jobs and renders them for reporting.
//!
//! ## Output Formats
//!
//! ### Document
//! A JSON object keyed by job id, 4-space indent, attributes in declaration order:
//! ```json
//! {
//!     "100": {
//!         "JobName": "sim",
//!         "Comment": "fre/ocean_run123",
//!         "Memory": 512,
//!         "Elapsed": 3600,
//!         "Node": "node01",
//!         "End": "2023-02-01",
//!         "State": "COMPLETED",
//!         "Type": "ocean run"
//!     }
//! }
//! ```
//!
//! ### Table
//! CSV rows without a header row; the column list is [`TableLayout::header`].

use crate::error::RenderError;
use crate::models::{JobMap, JobRecord};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::io::Write;

pub const DOCUMENT_INDENT: &[u8] = b"    ";

/// Order jobs by memory, largest first. Equal memory keeps insertion order.
pub fn sort(jobs: JobMap) -> Vec<JobRecord> {
    let mut records = jobs.into_records();
    // sort_by is stable
    records.sort_by(|a, b| b.memory.cmp(&a.memory));
    records
}

struct Document<'a>(&'a [JobRecord]);

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for record in self.0 {
            map.serialize_entry(&record.id, record)?;
        }
        map.end()
    }
}

/// Write `records` as a pretty JSON document keyed by job id.
pub fn render_document<W: Write>(records: &[JobRecord], mut writer: W) -> Result<(), RenderError> {
    let formatter = PrettyFormatter::with_indent(DOCUMENT_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    Document(records).serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn render_document_to_vec(records: &[JobRecord]) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Vec::new();
    render_document(records, &mut buffer)?;
    Ok(buffer)
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Vec<JobRecord>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of job records keyed by job id")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut records = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((id, mut record)) = access.next_entry::<String, JobRecord>()? {
            record.id = id;
            records.push(record);
        }
        Ok(records)
    }
}

/// Read a document produced by [`render_document`], keeping its key order.
pub fn parse_document(bytes: &[u8]) -> Result<Vec<JobRecord>, RenderError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let records = serde::Deserializer::deserialize_map(&mut deserializer, DocumentVisitor)?;
    deserializer.end()?;
    Ok(records)
}

/// Column sets for the tabular output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableLayout {
    #[default]
    Standard,
    /// Adds the job id up front and `ExitCode`/`User` at the end.
    Extended,
}

const STANDARD_HEADER: &[&str] = &[
    "JobName", "Comment", "Memory", "Elapsed", "Node", "End", "State", "Type",
];

const EXTENDED_HEADER: &[&str] = &[
    "JobID", "JobName", "Comment", "Memory", "Elapsed", "Node", "End", "State", "Type",
    "ExitCode", "User",
];

impl TableLayout {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            TableLayout::Standard => STANDARD_HEADER,
            TableLayout::Extended => EXTENDED_HEADER,
        }
    }

    fn row(&self, record: &JobRecord) -> Vec<String> {
        let mut row = Vec::with_capacity(self.header().len());
        if *self == TableLayout::Extended {
            row.push(record.id.clone());
        }
        row.extend([
            record.name.clone(),
            record.comment.clone(),
            record.memory.to_string(),
            record.elapsed.to_string(),
            record.node.clone(),
            record.end.clone(),
            record.state.clone(),
            record.job_type.clone(),
        ]);
        if *self == TableLayout::Extended {
            row.push(record.exit_code.clone().unwrap_or_default());
            row.push(record.user.clone().unwrap_or_default());
        }
        row
    }
}

/// Write one CSV row per record, no header row.
pub fn render_table<W: Write>(
    records: &[JobRecord],
    layout: TableLayout,
    writer: W,
) -> Result<(), RenderError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for record in records {
        csv_writer.write_record(layout.row(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, memory: u64) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            name: format!("job{}", id),
            comment: "fre/x".to_string(),
            memory,
            elapsed: 60,
            node: "node01".to_string(),
            end: "2023-02-01T00:00:00".to_string(),
            state: "COMPLETED".to_string(),
            job_type: "x".to_string(),
            exit_code: None,
            user: None,
        }
    }

    #[test]
    fn test_sort_descending_and_stable() {
        let mut jobs = JobMap::new();
        jobs.insert(record("a", 10));
        jobs.insert(record("b", 30));
        jobs.insert(record("c", 10));
        jobs.insert(record("d", 30));

        let ids: Vec<String> = sort(jobs).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_document_layout() {
        let text = String::from_utf8(render_document_to_vec(&[record("100", 512)]).unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"100\": {\n        \"JobName\": \"job100\","));
        let memory_at = text.find("\"Memory\"").unwrap();
        let type_at = text.find("\"Type\"").unwrap();
        assert!(memory_at < type_at);
        assert!(!text.contains("ExitCode"));
    }

    #[test]
    fn test_extended_row_width() {
        let mut full = record("9", 1);
        full.exit_code = Some("0:0".to_string());
        assert_eq!(TableLayout::Extended.row(&full).len(), TableLayout::Extended.header().len());
        assert_eq!(TableLayout::Standard.row(&full).len(), 8);
    }

    #[test]
    fn test_table_quotes_delimiter() {
        let mut quoted = record("1", 1);
        quoted.comment = "fre/a,b".to_string();
        let mut out = Vec::new();
        render_table(&[quoted], TableLayout::Standard, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("job1,\"fre/a,b\",1,60,"));
    }
}

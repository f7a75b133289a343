use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const OCEAN_JOB: &str = "100|sim|fre/ocean_run123|0|3600|node01|2023-02-01|COMPLETED";
pub const OCEAN_STEP: &str = "100.batch|batch||512K|3600|node01|2023-02-01|COMPLETED";

/// Job line plus its batch step line, in `sacct --parsable2` layout.
pub fn job_pair(id: &str, name: &str, comment: &str, memory: &str, elapsed: &str) -> [String; 2] {
    [
        format!("{id}|{name}|{comment}||{elapsed}|node01|2023-02-01T10:00:00|COMPLETED"),
        format!("{id}.batch|batch||{memory}|{elapsed}|node01|2023-02-01T10:00:00|COMPLETED"),
    ]
}

/// A mixed export resembling a week of FRE and interactive jobs.
pub fn realistic_export() -> Vec<String> {
    let mut lines = Vec::new();
    lines.extend(job_pair("201", "sim", "fre/ocean_run7", "2048K", "7200"));
    lines.extend(job_pair("202", "bash", "interactive", "64K", "30").into_iter().take(1));
    lines.extend(job_pair("203", "refineDiag_atmos", "fre/atmos", "1024K", ""));
    lines.extend(job_pair("204", "mppnccombine.csh", "fre/land_cm4", "", "120"));
    lines.extend(job_pair("205", "sim", "fre/ice_run12", "2048K", "3600"));
    lines.push("203.extern|extern|fre/atmos||0|node01|2023-02-01T10:00:00|COMPLETED".to_string());
    lines.push("203.extern|extern||4096K|0|node01|2023-02-01T10:00:00|COMPLETED".to_string());
    lines
}

pub fn write_export(dir: &Path, lines: &[String]) -> Result<PathBuf> {
    let path = dir.join("data_temp");
    fs::write(&path, lines.join("\n") + "\n")?;
    Ok(path)
}

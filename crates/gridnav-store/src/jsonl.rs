//! JSONL job files: one job per line.
//!
//! ```text
//! {"id": "42b7b4f2921788ea14dac5566e6f06d0", "statepoint": {"a": 1}}
//! {"statepoint": {"a": 2}}
//! ```
//!
//! `id` is optional; a missing id is computed by the store on load.

use gridnav_kernel::{JobId, ParameterMap};
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of a job file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub id: Option<JobId>,
    #[serde(alias = "sp", alias = "parameters")]
    pub statepoint: ParameterMap,
}

/// Errors from JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),

    #[error("corrupt job file: {0}")]
    Corrupt(String),
}

/// Read job records from a JSONL reader.
///
/// Blank lines and `#` comments are skipped.
pub fn read_records(reader: impl BufRead) -> Result<Vec<JobRecord>, JsonlError> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| JsonlError::Io(line_no + 1, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: JobRecord = serde_json::from_str(trimmed)
            .map_err(|e| JsonlError::Parse(line_no + 1, e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

/// Read job records from a file.
pub fn read_records_from_path(path: impl AsRef<Path>) -> Result<Vec<JobRecord>, JsonlError> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).map_err(|e| JsonlError::Io(0, format!("{}: {e}", path.display())))?;
    validate_bytes(path, &bytes)?;
    read_records(BufReader::new(bytes.as_slice()))
}

/// Reject files that cannot be a JSONL job list before parsing them.
fn validate_bytes(path: &Path, bytes: &[u8]) -> Result<(), JsonlError> {
    let problem = if bytes.contains(&0) {
        "NUL byte in job file"
    } else if std::str::from_utf8(bytes).is_err() {
        "job file is not valid UTF-8"
    } else {
        return Ok(());
    };
    Err(JsonlError::Corrupt(format!("{}: {problem}", path.display())))
}

//! signac-style workspace directories.
//!
//! ```text
//! workspace/
//!   42b7b4f2921788ea14dac5566e6f06d0/signac_statepoint.json
//!   9f8a8e5ba8c70c774d410a9107e2a32b/signac_statepoint.json
//! ```
//!
//! The directory name is the recorded job id.

use gridnav_kernel::{JobId, ParameterMap};
use std::fs;
use std::path::Path;

use crate::jsonl::JobRecord;

pub const STATEPOINT_FILENAME: &str = "signac_statepoint.json";

/// Errors raised while scanning a workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("{path}: invalid state point: {message}")]
    StatePoint { path: String, message: String },
}

/// Read every job directory under `root`, in directory-name order.
///
/// Entries that are not directories, or directories without a state point
/// file, are skipped.
pub fn read_workspace(root: impl AsRef<Path>) -> Result<Vec<JobRecord>, WorkspaceError> {
    let root = root.as_ref();
    let io_err = |path: &Path, e: std::io::Error| WorkspaceError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| io_err(root, e))? {
        let entry = entry.map_err(|e| io_err(root, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut records = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let statepoint_path = dir.join(STATEPOINT_FILENAME);
        if !statepoint_path.is_file() {
            tracing::debug!(dir = %dir.display(), "no state point file; skipping");
            continue;
        }
        let text = fs::read_to_string(&statepoint_path).map_err(|e| io_err(&statepoint_path, e))?;
        let statepoint: ParameterMap =
            serde_json::from_str(&text).map_err(|e| WorkspaceError::StatePoint {
                path: statepoint_path.display().to_string(),
                message: e.to_string(),
            })?;
        let id = dir
            .file_name()
            .map(|name| JobId::new(name.to_string_lossy().into_owned()));
        records.push(JobRecord { id, statepoint });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TempDirGuard {
        path: PathBuf,
    }

    impl TempDirGuard {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "gridnav-workspace-{prefix}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("temp dir should be created");
            Self { path }
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn reads_job_directories_in_name_order() {
        let tmp = TempDirGuard::new("order");
        for (id, sp) in [
            ("9f8a8e5ba8c70c774d410a9107e2a32b", json!({"a": 2})),
            ("42b7b4f2921788ea14dac5566e6f06d0", json!({"a": 1})),
        ] {
            let dir = tmp.path.join(id);
            fs::create_dir_all(&dir).expect("job dir");
            fs::write(dir.join(STATEPOINT_FILENAME), sp.to_string()).expect("state point");
        }
        fs::create_dir_all(tmp.path.join("scratch")).expect("stray dir");
        fs::write(tmp.path.join("README"), "not a job").expect("stray file");

        let records = read_workspace(&tmp.path).expect("reads");
        let ids: Vec<_> = records
            .iter()
            .filter_map(|r| r.id.as_ref().map(JobId::as_str))
            .collect();
        assert_eq!(
            ids,
            vec![
                "42b7b4f2921788ea14dac5566e6f06d0",
                "9f8a8e5ba8c70c774d410a9107e2a32b"
            ]
        );
        assert_eq!(records[0].statepoint["a"], json!(1));
    }

    #[test]
    fn malformed_state_point_names_the_file() {
        let tmp = TempDirGuard::new("malformed");
        let dir = tmp.path.join("broken");
        fs::create_dir_all(&dir).expect("job dir");
        fs::write(dir.join(STATEPOINT_FILENAME), "[1, 2]").expect("state point");

        let err = read_workspace(&tmp.path).expect_err("array is not a state point");
        assert!(matches!(
            err,
            WorkspaceError::StatePoint { ref path, .. } if path.contains("broken")
        ));
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let err = read_workspace("/definitely/not/a/gridnav/workspace").expect_err("missing");
        assert!(matches!(err, WorkspaceError::Io { .. }));
    }
}

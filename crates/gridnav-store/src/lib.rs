//! # gridnav-store
//!
//! The project side of navigation: where jobs come from.
//!
//! This crate provides:
//! - `JobRecord` JSONL reading (portable job lists)
//! - signac-style workspace scanning (`<id>/signac_statepoint.json`)
//! - `JobStore`, the deterministic in-memory collection, which verifies
//!   every recorded id against the shared addresser and implements
//!   `JobSource` for the kernel
//!
//! ```text
//! jobs.jsonl | workspace/
//!     ↓  load + id verification
//! JobStore ──JobSource──▶ gridnav_kernel::Navigator
//! ```

pub mod jsonl;
pub mod store;
pub mod workspace;

pub use jsonl::{JobRecord, JsonlError, read_records, read_records_from_path};
pub use store::{JobStore, JobStoreError};
pub use workspace::{STATEPOINT_FILENAME, WorkspaceError, read_workspace};

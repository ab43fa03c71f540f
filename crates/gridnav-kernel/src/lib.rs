//! # gridnav kernel
//!
//! Nearest-neighbor navigation over a sparse grid of content-addressed jobs.
//! For every varying parameter of a job, the index answers "which existing
//! job differs from this one only in that parameter, with the next lower
//! (or higher) value?".
//!
//! The kernel knows nothing about presentation: it hands out raw neighbor
//! ids and values. Truncation, links and labels belong to the caller.
//!
//! ## Architecture
//!
//! ```text
//! JobSource                 ← project collaborator: (id, parameters) pairs
//!     │
//! Schema                    ← varying keys, sorted distinct values
//!     │
//! ShadowMapping (optional)  ← nuisance keys removed, injectivity checked
//!     │
//! NeighborIndexBuilder      ← outward walk, one hashed probe per candidate
//!     │
//! NeighborIndex             ← immutable id → neighbors
//! ```
//!
//! Every id is computed through one [`ContentAddresser`]; see
//! [`identity`] for why that matters.

pub mod config;
pub mod error;
pub mod identity;
pub mod navigator;
pub mod neighbor;
pub mod params;
pub mod schema;
pub mod shadow;

pub use config::{ConfigError, NavigatorConfig, ProjectionMode};
pub use error::{BoxError, NavigatorError};
pub use identity::{
    ContentAddresser, IdMismatch, SignacAddresser, canonical_json, find_id_mismatches,
};
pub use navigator::{BuiltNavigator, JobSource, Navigator};
pub use neighbor::{
    KeyNeighbors, Neighbor, NeighborEntry, NeighborIndex, NeighborIndexBuilder, NeighborRef,
    Sentinel, value_label,
};
pub use params::{Job, JobId, ParameterMap};
pub use schema::{Domain, DomainOrder, Schema};
pub use shadow::{AmbiguousProjection, ShadowCollision, ShadowMapping};

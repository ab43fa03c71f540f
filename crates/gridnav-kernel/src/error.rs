//! Error types for navigator builds.

use crate::identity::IdMismatch;
use crate::params::JobId;
use crate::shadow::AmbiguousProjection;

/// Boxed error raised by a collaborator (job source, schema source).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors arising while building a neighbor index.
#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    /// Ignoring the configured keys maps several jobs onto one shadow id.
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousProjection),

    /// Recorded job ids disagree with the addresser; every probe would miss.
    #[error("{} job id(s) do not match their parameters (first: recorded {}, computed {})",
        .0.len(),
        .0.first().map(|m| m.recorded.as_str()).unwrap_or("-"),
        .0.first().map(|m| m.computed.as_str()).unwrap_or("-"))]
    IdMismatch(Vec<IdMismatch>),

    /// A caller-supplied schema does not contain a job's value.
    #[error("job {id}: value {value} for `{key}` is not in the schema domain")]
    ValueOutsideDomain {
        id: JobId,
        key: String,
        value: String,
    },

    /// The job source failed; its error is passed through unchanged.
    #[error(transparent)]
    Source(BoxError),
}

//! Error taxonomy for inference and query selection.

use thiserror::Error;

/// Errors surfaced by the inference core.
///
/// Validation failures are reported before any state is touched, so a
/// caller that holds a previously valid posterior can keep using it after
/// a rejected step.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied data failed validation: out-of-range or duplicate
    /// item indices, malformed prior or sample-batch shapes, non-positive
    /// scale parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A linear-algebra or probability computation lost numerical footing:
    /// a singular factorization, or an estimate that failed to converge.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// A numerical collaborator errored internally (e.g. the tilting
    /// solver behind the truncated sampler).
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

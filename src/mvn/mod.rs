//! Truncated multivariate-normal primitives.
//!
//! The inference core consumes these two collaborators strictly through
//! their public interfaces:
//!
//! - [`TruncatedMvn`]: exact sampling from `N(mean, Σ)` conditioned on a
//!   componentwise box, one-sided boxes included.
//! - [`log_mvn_cdf`]: log-scale estimation of `Φ_m`, the box mass of a
//!   zero-mean multivariate normal.
//!
//! Both are built on Botev's minimax-tilting method
//! (doi:10.1111/rssb.12162): a Cholesky factorization with greedy
//! variable reordering, an exponentially tilted sequential proposal, and
//! either accept-reject (sampling) or importance weighting (CDF
//! estimation) on top of it.

mod normal;
mod orthant;
mod tilting;
mod truncated;

pub use orthant::log_mvn_cdf;
pub use truncated::TruncatedMvn;

pub(crate) use normal::{ln_normal_cdf, normal_cdf};

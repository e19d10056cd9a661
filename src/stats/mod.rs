//! Active-query statistics and posterior summaries.
//!
//! Two strategies rank candidate comparisons by expected
//! informativeness:
//!
//! - [`comparison_entropy`]: Monte-Carlo pairwise entropy; the primary
//!   selection strategy.
//! - [`min_skewness_pair`]: closed-form skewness-norm heuristic; cheaper
//!   and kept as a diagnostic, since its equivalence to the entropy
//!   criterion is unproven.
//!
//! [`lddp`] estimates how far the posterior has moved from the prior
//! (negative KL divergence); the `summary` functions feed display layers.

mod entropy;
mod lddp;
mod skewness;
mod summary;

pub use entropy::{comparison_entropy, comparison_entropy_fresh, EntropyStats};
pub use lddp::{lddp, lddp_fresh};
pub use skewness::{min_skewness_pair, skewness_norms};
pub use summary::{expected_ranks, posterior_mean, rank_probabilities};

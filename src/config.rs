//! Configuration for posterior construction and the numerical primitives.

/// Tuning knobs threaded through inference.
///
/// The probit scale is the single modelling parameter and is required at
/// construction; the remaining fields are numerical budgets with defaults
/// that work for sessions of tens to low hundreds of comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Probit scale β: the inverse noise level of comparison judgments.
    ///
    /// Larger values make recorded outcomes closer to deterministic sign
    /// readings of the latent score difference. Must be positive and
    /// finite; enters the posterior through `Γ = I/β² + DΣDᵀ` and the
    /// pairwise win probabilities `Φ(β·(x_i − x_j))`.
    pub probit_scale: f64,

    /// Monte-Carlo draws used by the orthant-probability estimator when
    /// computing the divergence metric's normalization constant.
    pub orthant_draws: usize,

    /// Accept-reject rounds the truncated sampler may spend per batch
    /// before falling back to raw proposal draws (with a warning).
    pub max_rejection_rounds: usize,
}

impl Config {
    /// Create a configuration with the given probit scale and default
    /// numerical budgets.
    pub fn new(probit_scale: f64) -> Self {
        Self {
            probit_scale,
            orthant_draws: 2_000,
            max_rejection_rounds: 10_000,
        }
    }
}

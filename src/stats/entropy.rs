//! Monte-Carlo pairwise entropy for active query selection.
//!
//! For each unordered item pair the win probability is averaged over a
//! posterior sample batch and scored by binary entropy; the pair closest
//! to a 50/50 outcome is the most informative one to ask a human about
//! next under a max-entropy query policy.

use rand::Rng;

use crate::error::{Error, Result};
use crate::model::Posterior;
use crate::mvn::normal_cdf;
use crate::types::Matrix;

/// Win probabilities are clamped away from 0 and 1 before taking logs.
const PROB_CLAMP: f64 = 1e-12;

/// Entropy statistics over all `n(n−1)/2` unordered item pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyStats {
    /// Mean binary entropy across all pairs; a progress metric that
    /// decays toward zero as the ranking resolves.
    pub avg_entropy: f64,
    /// The pair `(i, j)` with the largest entropy, `i < j`.
    pub max_entropy_pair: (usize, usize),
    /// The entropy of that pair.
    pub max_entropy: f64,
}

/// Compute pairwise entropy statistics on a given sample batch.
///
/// `samples` is `n×k` with one posterior draw per column. Requires at
/// least two items and one sample column ([`Error::InvalidInput`]
/// otherwise).
pub fn comparison_entropy(samples: &Matrix, probit_scale: f64) -> Result<EntropyStats> {
    let n = samples.nrows();
    let k = samples.ncols();
    if n < 2 {
        return Err(Error::InvalidInput(format!(
            "entropy statistics need at least 2 items, got {n}"
        )));
    }
    if k == 0 {
        return Err(Error::InvalidInput(
            "entropy statistics need at least one sample column".into(),
        ));
    }
    if !(probit_scale.is_finite() && probit_scale > 0.0) {
        return Err(Error::InvalidInput(format!(
            "probit scale must be positive and finite, got {probit_scale}"
        )));
    }

    let mut total = 0.0;
    let mut max_entropy = f64::NEG_INFINITY;
    let mut max_pair = (0, 1);
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            let mut p = 0.0;
            for s in 0..k {
                p += normal_cdf(probit_scale * (samples[(i, s)] - samples[(j, s)]));
            }
            p /= k as f64;
            let entropy = binary_entropy(p.clamp(PROB_CLAMP, 1.0 - PROB_CLAMP));
            total += entropy;
            if entropy > max_entropy {
                max_entropy = entropy;
                max_pair = (i, j);
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    Ok(EntropyStats {
        avg_entropy: total / pairs,
        max_entropy_pair: max_pair,
        max_entropy,
    })
}

/// Draw a fresh batch from the posterior and compute entropy statistics
/// on it.
pub fn comparison_entropy_fresh<R: Rng>(
    posterior: &Posterior,
    count: usize,
    rng: &mut R,
) -> Result<EntropyStats> {
    let samples = posterior.sample(count, rng)?;
    comparison_entropy(&samples, posterior.probit_scale())
}

/// `H(p) = −p·ln p − (1−p)·ln(1−p)`.
fn binary_entropy(p: f64) -> f64 {
    -p * p.ln() - (1.0 - p) * (1.0 - p).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn binary_entropy_endpoints() {
        assert_relative_eq!(binary_entropy(0.5), std::f64::consts::LN_2, epsilon = 1e-12);
        assert!(binary_entropy(PROB_CLAMP) < 1e-10);
        assert!(binary_entropy(1.0 - PROB_CLAMP) < 1e-10);
    }

    #[test]
    fn symmetric_samples_give_maximum_entropy() {
        // Two items that alternate winning: p̄ = 0.5 exactly.
        let samples = Matrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]);
        let stats = comparison_entropy(&samples, 1.0).unwrap();
        assert_relative_eq!(stats.avg_entropy, std::f64::consts::LN_2, epsilon = 1e-9);
        assert_eq!(stats.max_entropy_pair, (0, 1));
    }

    #[test]
    fn resolved_pair_has_low_entropy() {
        // Item 0 always far above item 1.
        let samples = Matrix::from_row_slice(2, 3, &[10.0, 10.0, 10.0, -10.0, -10.0, -10.0]);
        let stats = comparison_entropy(&samples, 1.0).unwrap();
        assert!(stats.avg_entropy < 1e-6, "got {}", stats.avg_entropy);
    }

    #[test]
    fn picks_the_most_uncertain_pair() {
        // Items 0 and 1 are far apart; item 2 sits between them, closer
        // to item 1, so (1, 2) is the most uncertain matchup.
        let samples = Matrix::from_row_slice(
            3,
            4,
            &[
                5.0, 5.0, 5.0, 5.0, // item 0
                -5.0, -5.0, -5.0, -5.0, // item 1
                -4.9, -5.1, -4.8, -5.2, // item 2
            ],
        );
        let stats = comparison_entropy(&samples, 1.0).unwrap();
        assert_eq!(stats.max_entropy_pair, (1, 2));
        assert!(stats.max_entropy > 0.5);
    }

    #[test]
    fn single_item_batch_is_invalid() {
        let samples = Matrix::from_row_slice(1, 3, &[0.0, 1.0, 2.0]);
        assert!(matches!(
            comparison_entropy(&samples, 1.0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_batch_is_invalid() {
        let samples = Matrix::zeros(3, 0);
        assert!(matches!(
            comparison_entropy(&samples, 1.0),
            Err(Error::InvalidInput(_))
        ));
    }
}

//! Closed-form skewness-norm heuristic for active query selection.
//!
//! For a contrast `c_ij` (+1 at `i`, −1 at `j`) the quadratic form
//! `s(i,j) = c_ijᵀ (ΔΔᵀ) c_ij` measures how much residual skew the
//! posterior carries along that comparison direction. A small value means
//! the matchup is still close to symmetric, hence undetermined, and
//! worth asking about. One `ΔΔᵀ` product serves every pair, so the whole
//! table costs `O(n³)` against the Monte-Carlo strategy's
//! `O(n²·samples)`.

use crate::error::{Error, Result};
use crate::model::Posterior;
use crate::types::Matrix;

/// The full `n×n` table of skewness norms `s(i,j)`.
///
/// Symmetric with an identically zero diagonal: the diagonal contrast is
/// the zero vector, not a masked entry.
pub fn skewness_norms(posterior: &Posterior) -> Matrix {
    let delta = posterior.delta();
    let gram = delta * delta.transpose();
    let n = gram.nrows();
    let mut norms = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            norms[(i, j)] = gram[(i, i)] - 2.0 * gram[(i, j)] + gram[(j, j)];
        }
    }
    norms
}

/// The pair `(i, j)` with `i < j` minimizing the skewness norm.
///
/// The diagonal is structurally excluded from the argmin. Requires at
/// least two items.
pub fn min_skewness_pair(posterior: &Posterior) -> Result<(usize, usize)> {
    let n = posterior.n_items();
    if n < 2 {
        return Err(Error::InvalidInput(format!(
            "query selection needs at least 2 items, got {n}"
        )));
    }
    let norms = skewness_norms(posterior);
    let mut best = f64::INFINITY;
    let mut best_pair = (0, 1);
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            if norms[(i, j)] < best {
                best = norms[(i, j)];
                best_pair = (i, j);
            }
        }
    }
    Ok(best_pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::Posterior;
    use crate::prior::GaussianPrior;
    use crate::types::Comparison;
    use approx::assert_relative_eq;

    fn three_item_posterior(comparisons: &[Comparison]) -> Posterior {
        Posterior::infer(&GaussianPrior::standard(3), comparisons, &Config::new(1.0)).unwrap()
    }

    #[test]
    fn norms_are_symmetric_with_zero_diagonal() {
        let posterior = three_item_posterior(&[Comparison::new(0, 1), Comparison::new(1, 2)]);
        let norms = skewness_norms(&posterior);
        for i in 0..3 {
            assert_eq!(norms[(i, i)], 0.0, "diagonal must be identically zero");
            for j in 0..3 {
                assert_relative_eq!(norms[(i, j)], norms[(j, i)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn resolved_pair_is_not_selected() {
        // After comparing 0 and 1, the pairs touching item 2 carry less
        // skew: Δ = [1, −1, 0]ᵀ gives s(0,1) = 4, s(0,2) = s(1,2) = 1.
        let posterior = three_item_posterior(&[Comparison::new(0, 1)]);
        let norms = skewness_norms(&posterior);
        assert_relative_eq!(norms[(0, 1)], 4.0, epsilon = 1e-12);
        assert_relative_eq!(norms[(0, 2)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(norms[(1, 2)], 1.0, epsilon = 1e-12);

        let pair = min_skewness_pair(&posterior).unwrap();
        assert_ne!(pair, (0, 1));
    }

    #[test]
    fn fresh_posterior_picks_the_first_pair() {
        // Without comparisons Δ is empty and every norm is zero; the
        // argmin falls back to the first off-diagonal pair.
        let posterior = three_item_posterior(&[]);
        assert_eq!(min_skewness_pair(&posterior).unwrap(), (0, 1));
    }

    #[test]
    fn pair_ordering_is_canonical() {
        let posterior = three_item_posterior(&[Comparison::new(2, 0)]);
        let (left, right) = min_skewness_pair(&posterior).unwrap();
        assert!(left < right);
    }

    #[test]
    fn single_item_is_invalid() {
        let posterior =
            Posterior::infer(&GaussianPrior::standard(1), &[], &Config::new(1.0)).unwrap();
        assert!(matches!(
            min_skewness_pair(&posterior),
            Err(Error::InvalidInput(_))
        ));
    }
}

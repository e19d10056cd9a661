//! Posterior summaries consumed by presentation layers.
//!
//! Sampling feeds these directly: per-item means, rank-probability
//! tables, and expected ranks. Rank 0 is the highest score.

use crate::error::{Error, Result};
use crate::types::{Matrix, Vector};

/// Per-item posterior mean score over a sample batch (`n×k`, one draw
/// per column).
pub fn posterior_mean(samples: &Matrix) -> Result<Vector> {
    if samples.ncols() == 0 {
        return Err(Error::InvalidInput(
            "summary statistics need at least one sample column".into(),
        ));
    }
    Ok(samples.column_mean())
}

/// Rank-probability table: entry `(i, r)` is the fraction of draws in
/// which item `i` holds rank `r` (rank 0 = highest score).
///
/// Rows sum to one, as do columns.
pub fn rank_probabilities(samples: &Matrix) -> Result<Matrix> {
    let n = samples.nrows();
    let k = samples.ncols();
    if n == 0 || k == 0 {
        return Err(Error::InvalidInput(
            "rank statistics need a non-empty sample batch".into(),
        ));
    }

    let mut counts = Matrix::zeros(n, n);
    let mut order: Vec<usize> = (0..n).collect();
    for j in 0..k {
        let column = samples.column(j);
        order.sort_by(|&a, &b| column[b].total_cmp(&column[a]));
        for (rank, &item) in order.iter().enumerate() {
            counts[(item, rank)] += 1.0;
        }
    }
    Ok(counts / k as f64)
}

/// Mean rank per item over a sample batch (rank 0 = highest score).
pub fn expected_ranks(samples: &Matrix) -> Result<Vector> {
    let table = rank_probabilities(samples)?;
    let n = table.nrows();
    let mut ranks = Vector::zeros(n);
    for i in 0..n {
        ranks[i] = (0..n).map(|r| r as f64 * table[(i, r)]).sum();
    }
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_is_per_item() {
        let samples = Matrix::from_row_slice(2, 2, &[1.0, 3.0, -1.0, -3.0]);
        let mean = posterior_mean(&samples).unwrap();
        assert_relative_eq!(mean[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(mean[1], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn deterministic_ordering_concentrates_rank_mass() {
        // Item 1 always first, item 0 always second, item 2 always last.
        let samples = Matrix::from_row_slice(3, 2, &[1.0, 1.0, 5.0, 5.0, -2.0, -2.0]);
        let table = rank_probabilities(&samples).unwrap();
        assert_relative_eq!(table[(1, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(table[(0, 1)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(table[(2, 2)], 1.0, epsilon = 1e-12);

        let ranks = expected_ranks(&samples).unwrap();
        assert_relative_eq!(ranks[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(ranks[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(ranks[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn table_rows_and_columns_are_distributions() {
        let samples = Matrix::from_row_slice(3, 3, &[1.0, -1.0, 0.5, 0.0, 2.0, -0.5, -1.0, 1.0, 0.0]);
        let table = rank_probabilities(&samples).unwrap();
        for i in 0..3 {
            assert_relative_eq!(table.row(i).sum(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(table.column(i).sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_batch_is_invalid() {
        assert!(matches!(
            posterior_mean(&Matrix::zeros(3, 0)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            rank_probabilities(&Matrix::zeros(0, 5)),
            Err(Error::InvalidInput(_))
        ));
    }
}

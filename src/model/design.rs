//! Design-matrix construction for recorded comparisons.

use crate::error::{Error, Result};
use crate::types::{Comparison, Matrix};

/// Build the `m×n` sign matrix for an ordered comparison list: row `k`
/// holds `+1` at `winner_k`, `-1` at `loser_k`, zero elsewhere.
///
/// Every index is validated against `n_items` and self-comparisons are
/// rejected, both with [`Error::InvalidInput`].
pub fn design_matrix(n_items: usize, comparisons: &[Comparison]) -> Result<Matrix> {
    let mut design = Matrix::zeros(comparisons.len(), n_items);
    for (row, comparison) in comparisons.iter().enumerate() {
        let far = comparison.winner.max(comparison.loser);
        if far >= n_items {
            return Err(Error::InvalidInput(format!(
                "comparison {row} references item {far} but only {n_items} items exist"
            )));
        }
        if comparison.winner == comparison.loser {
            return Err(Error::InvalidInput(format!(
                "comparison {row} pits item {} against itself",
                comparison.winner
            )));
        }
        design[(row, comparison.winner)] = 1.0;
        design[(row, comparison.loser)] = -1.0;
    }
    Ok(design)
}

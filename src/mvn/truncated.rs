//! Exact sampling from box-truncated multivariate normals.

use rand::Rng;

use crate::error::{Error, Result};
use crate::types::{Matrix, Vector};

use super::normal::trunc_std_normal;
use super::tilting::TiltedProposal;

/// Accept-reject round count at which a low-acceptance warning is logged.
const LOW_ACCEPTANCE_ROUNDS: usize = 1_000;

/// Default rejection budget per sampling batch.
const DEFAULT_REJECTION_BUDGET: usize = 10_000;

/// A multivariate normal `N(mean, covariance)` conditioned on the box
/// `[lower, upper]` componentwise, preprocessed for repeated exact
/// sampling.
///
/// One-sided boxes (`upper = +∞` per component) are supported. The
/// expensive work (the reordered Cholesky factorization and the
/// minimax-tilting solve) happens once in [`TruncatedMvn::new`];
/// [`TruncatedMvn::sample`] only runs the accept-reject loop.
#[derive(Debug, Clone)]
pub struct TruncatedMvn {
    mean: Vector,
    kind: Kind,
    rejection_budget: usize,
}

#[derive(Debug, Clone)]
enum Kind {
    /// Zero-dimensional region; samples are empty columns.
    Empty,
    /// One dimension needs no tilting: standardized bounds and the
    /// standard-deviation scale are enough.
    Univariate { scale: f64, lower: f64, upper: f64 },
    /// General case driven by the tilted sequential proposal.
    Tilted(TiltedProposal),
}

impl TruncatedMvn {
    /// Preprocess the truncated distribution.
    ///
    /// Fails with [`Error::InvalidInput`] on shape mismatches or an empty
    /// box (`lower > upper` in any component), and with
    /// [`Error::Numerical`] when the covariance cannot support the
    /// region.
    pub fn new(mean: Vector, covariance: Matrix, lower: Vector, upper: Vector) -> Result<Self> {
        let d = mean.len();
        if covariance.nrows() != d || covariance.ncols() != d {
            return Err(Error::InvalidInput(format!(
                "covariance is {}x{} but the mean has {d} components",
                covariance.nrows(),
                covariance.ncols(),
            )));
        }
        if lower.len() != d || upper.len() != d {
            return Err(Error::InvalidInput(format!(
                "bounds have {} and {} components, expected {d}",
                lower.len(),
                upper.len(),
            )));
        }
        if lower.iter().zip(upper.iter()).any(|(&l, &u)| l > u) {
            return Err(Error::InvalidInput(
                "truncation box is empty: a lower bound exceeds its upper bound".into(),
            ));
        }

        // Work with the centered region; the mean is added back on output.
        let lower_c = &lower - &mean;
        let upper_c = &upper - &mean;

        let kind = match d {
            0 => Kind::Empty,
            1 => {
                let variance = covariance[(0, 0)];
                if !(variance.is_finite() && variance > 0.0) {
                    return Err(Error::Numerical(format!(
                        "univariate truncation needs positive variance, got {variance}"
                    )));
                }
                let scale = variance.sqrt();
                Kind::Univariate {
                    scale,
                    lower: lower_c[0] / scale,
                    upper: upper_c[0] / scale,
                }
            }
            _ => Kind::Tilted(TiltedProposal::new(&covariance, &lower_c, &upper_c)?),
        };

        Ok(Self {
            mean,
            kind,
            rejection_budget: DEFAULT_REJECTION_BUDGET,
        })
    }

    /// Replace the accept-reject round budget.
    pub fn with_rejection_budget(mut self, rounds: usize) -> Self {
        self.rejection_budget = rounds.max(1);
        self
    }

    /// Dimension of the distribution.
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Draw `count` independent samples, one per column.
    ///
    /// Every returned column is an exact draw; if the rejection budget is
    /// exhausted the remaining columns are taken from the tilted proposal
    /// and a warning is logged.
    pub fn sample<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Matrix> {
        if count == 0 {
            return Err(Error::InvalidInput("sample count must be positive".into()));
        }
        match &self.kind {
            Kind::Empty => Ok(Matrix::zeros(0, count)),
            Kind::Univariate { scale, lower, upper } => {
                let mut out = Matrix::zeros(1, count);
                for j in 0..count {
                    out[(0, j)] = self.mean[0] + scale * trunc_std_normal(rng, *lower, *upper);
                }
                Ok(out)
            }
            Kind::Tilted(proposal) => self.sample_tilted(proposal, count, rng),
        }
    }

    fn sample_tilted<R: Rng>(
        &self,
        proposal: &TiltedProposal,
        count: usize,
        rng: &mut R,
    ) -> Result<Matrix> {
        let d = self.dimension();
        let mut accepted: Vec<Vector> = Vec::with_capacity(count);
        let mut rounds = 0usize;

        while accepted.len() < count {
            let need = count - accepted.len();
            let (log_weights, draws) = proposal.draw(need, rng);
            for i in 0..need {
                // Accept with probability exp(log_weight − envelope).
                if -rng.random::<f64>().ln() > proposal.log_envelope - log_weights[i] {
                    accepted.push(draws.column(i).into_owned());
                }
            }
            rounds += 1;
            if rounds == LOW_ACCEPTANCE_ROUNDS {
                tracing::warn!(rounds, "truncated-normal acceptance rate below 0.1%");
            }
            if rounds > self.rejection_budget && accepted.len() < count {
                tracing::warn!(
                    missing = count - accepted.len(),
                    "rejection budget exhausted; remaining draws taken from the tilted proposal"
                );
                while accepted.len() < count {
                    let (_, draws) = proposal.draw(1, rng);
                    accepted.push(draws.column(0).into_owned());
                }
            }
        }

        // Map back: scale through the Cholesky factor, undo the pivoting
        // permutation, and restore the mean.
        let raw = &proposal.chol * Matrix::from_columns(&accepted);
        let mut out = Matrix::zeros(d, count);
        for (row, &target) in proposal.perm.iter().enumerate() {
            out.row_mut(target).copy_from(&raw.row(row));
        }
        for j in 0..count {
            let mut column = out.column_mut(j);
            column += &self.mean;
        }
        Ok(out)
    }
}

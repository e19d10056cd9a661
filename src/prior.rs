//! Gaussian prior over latent item scores.

use crate::error::{Error, Result};
use crate::types::{Matrix, Vector};

/// A multivariate normal prior `N(μ, Σ)` over the latent scores.
///
/// The covariance must be symmetric; positive definiteness is checked at
/// posterior construction, where its failure is a numerical error rather
/// than an input error.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianPrior {
    mean: Vector,
    covariance: Matrix,
}

/// Relative tolerance for the symmetry check on `Σ`.
const SYMMETRY_TOL: f64 = 1e-9;

impl GaussianPrior {
    /// Create a prior from an explicit mean and covariance.
    pub fn new(mean: Vector, covariance: Matrix) -> Result<Self> {
        let n = mean.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(Error::InvalidInput(format!(
                "prior covariance is {}x{} but the mean has {n} components",
                covariance.nrows(),
                covariance.ncols(),
            )));
        }
        let scale = covariance
            .iter()
            .fold(0.0_f64, |acc, &v| acc.max(v.abs()))
            .max(1.0);
        for i in 0..n {
            for j in (i + 1)..n {
                if (covariance[(i, j)] - covariance[(j, i)]).abs() > SYMMETRY_TOL * scale {
                    return Err(Error::InvalidInput(format!(
                        "prior covariance is asymmetric at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(Self { mean, covariance })
    }

    /// Standard normal prior: zero mean, identity covariance.
    pub fn standard(n: usize) -> Self {
        Self {
            mean: Vector::zeros(n),
            covariance: Matrix::identity(n, n),
        }
    }

    /// Zero-mean prior with covariance `variance · I`.
    pub fn isotropic(n: usize, variance: f64) -> Result<Self> {
        if !(variance.is_finite() && variance > 0.0) {
            return Err(Error::InvalidInput(format!(
                "prior variance must be positive and finite, got {variance}"
            )));
        }
        Ok(Self {
            mean: Vector::zeros(n),
            covariance: Matrix::identity(n, n) * variance,
        })
    }

    /// Number of items the prior covers.
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Prior mean μ.
    pub fn mean(&self) -> &Vector {
        &self.mean
    }

    /// Prior covariance Σ.
    pub fn covariance(&self) -> &Matrix {
        &self.covariance
    }
}

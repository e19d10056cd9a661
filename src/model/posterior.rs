//! The SUN posterior for the Thurstonian comparison model.
//!
//! Under the model each item carries a latent score; a recorded judgment
//! "i beats j" is a noisy probit sign reading of `x_i − x_j`. With a
//! Gaussian prior `N(μ, Σ)` and `m` judgments collected in the sign
//! matrix `D`, the exact posterior is a unified skew-normal distribution
//! with parameters
//!
//! ```text
//! ξ  = μ
//! Δ  = Σ Dᵀ
//! Γ  = I/β² + D Σ Dᵀ
//! Ψ̄  = Σ − ΔΓ⁻¹Δᵀ
//! ```
//!
//! and a skew component distributed as `N(0, Γ)` truncated below at
//! `−Dμ`. A posterior draw is `ξ + U₀ + ΔΓ⁻¹U₁` with `U₀ ~ N(0, Ψ̄)` and
//! `U₁` from the truncated component, which is exact rather than
//! approximate. See <https://link.springer.com/article/10.1007/s00362-021-01235-2>
//! for the SUN notational conventions and background on the sampler.

use nalgebra::Cholesky;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mvn::TruncatedMvn;
use crate::prior::GaussianPrior;
use crate::types::{Comparison, Matrix, Vector};

use super::design::design_matrix;

/// The posterior over latent item scores after a set of comparisons.
///
/// A pure function of `(μ, Σ, D, β)`: immutable once constructed and
/// recomputed wholesale whenever the comparison list changes. The
/// Cholesky factor of `Ψ̄` and the truncated component's tilting are
/// precomputed here so [`Posterior::sample`] does no refactoring.
#[derive(Debug, Clone)]
pub struct Posterior {
    config: Config,
    prior: GaussianPrior,
    design: Matrix,
    xi: Vector,
    delta: Matrix,
    gamma: Matrix,
    delta_gamma_inv: Matrix,
    psi_bar: Matrix,
    psi_bar_root: Matrix,
    skew: TruncatedMvn,
}

impl Posterior {
    /// Derive the posterior from a prior, an ordered comparison list, and
    /// the inference configuration.
    ///
    /// Input problems (bad indices, non-positive probit scale) surface as
    /// [`Error::InvalidInput`]; a degenerate prior (`n = 0` or a
    /// covariance that is not positive definite) as [`Error::Numerical`].
    /// Construction leaves no partial state behind on failure.
    pub fn infer(
        prior: &GaussianPrior,
        comparisons: &[Comparison],
        config: &Config,
    ) -> Result<Self> {
        let beta = config.probit_scale;
        if !(beta.is_finite() && beta > 0.0) {
            return Err(Error::InvalidInput(format!(
                "probit scale must be positive and finite, got {beta}"
            )));
        }
        let n = prior.dimension();
        if n == 0 {
            return Err(Error::Numerical("prior has dimension zero".into()));
        }
        if Cholesky::new(prior.covariance().clone()).is_none() {
            return Err(Error::Numerical(
                "prior covariance is not positive definite".into(),
            ));
        }

        let design = design_matrix(n, comparisons)?;
        let m = design.nrows();

        let delta = prior.covariance() * design.transpose();
        let mut gamma = Matrix::identity(m, m) * (1.0 / (beta * beta)) + &design * &delta;
        symmetrize(&mut gamma);

        let delta_gamma_inv = if m == 0 {
            Matrix::zeros(n, 0)
        } else {
            let gamma_chol = Cholesky::new(gamma.clone()).ok_or_else(|| {
                Error::Numerical("comparison covariance Γ is not positive definite".into())
            })?;
            gamma_chol.solve(&delta.transpose()).transpose()
        };

        let mut psi_bar = prior.covariance() - &delta_gamma_inv * delta.transpose();
        symmetrize(&mut psi_bar);
        let psi_bar_root = factor_with_jitter(&psi_bar)?;

        let skew = TruncatedMvn::new(
            Vector::zeros(m),
            gamma.clone(),
            -(&design * prior.mean()),
            Vector::from_element(m, f64::INFINITY),
        )?
        .with_rejection_budget(config.max_rejection_rounds);

        tracing::debug!(n_items = n, n_comparisons = m, "posterior model rebuilt");

        Ok(Self {
            config: config.clone(),
            prior: prior.clone(),
            xi: prior.mean().clone(),
            design,
            delta,
            gamma,
            delta_gamma_inv,
            psi_bar,
            psi_bar_root,
            skew,
        })
    }

    /// Draw `count` exact posterior samples, one `n`-vector per column.
    ///
    /// Determinism is caller-owned through `rng`; the posterior itself
    /// holds no generator state. A failure propagates before anything is
    /// returned; there are no partial batches.
    pub fn sample<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Matrix> {
        if count == 0 {
            return Err(Error::InvalidInput("sample count must be positive".into()));
        }
        let n = self.n_items();
        let mut gaussian = Matrix::zeros(n, count);
        for j in 0..count {
            for i in 0..n {
                gaussian[(i, j)] = rng.sample(StandardNormal);
            }
        }
        let mut draws = &self.psi_bar_root * gaussian;
        if self.n_comparisons() > 0 {
            let skew = self.skew.sample(count, rng)?;
            draws += &self.delta_gamma_inv * skew;
        }
        for j in 0..count {
            let mut column = draws.column_mut(j);
            column += &self.xi;
        }
        Ok(draws)
    }

    /// Number of items `n`.
    pub fn n_items(&self) -> usize {
        self.xi.len()
    }

    /// Number of recorded comparisons `m`.
    pub fn n_comparisons(&self) -> usize {
        self.design.nrows()
    }

    /// The probit scale β used to build this posterior.
    pub fn probit_scale(&self) -> f64 {
        self.config.probit_scale
    }

    /// The configuration used to build this posterior.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The prior this posterior was derived from.
    pub fn prior(&self) -> &GaussianPrior {
        &self.prior
    }

    /// The `m×n` comparison sign matrix `D`.
    pub fn design(&self) -> &Matrix {
        &self.design
    }

    /// Location parameter `ξ = μ`.
    pub fn xi(&self) -> &Vector {
        &self.xi
    }

    /// Skewness matrix `Δ = Σ Dᵀ` (`n×m`).
    pub fn delta(&self) -> &Matrix {
        &self.delta
    }

    /// Comparison-space covariance `Γ = I/β² + D Σ Dᵀ` (`m×m`).
    pub fn gamma(&self) -> &Matrix {
        &self.gamma
    }

    /// The precomputed product `ΔΓ⁻¹` (`n×m`).
    pub fn delta_gamma_inv(&self) -> &Matrix {
        &self.delta_gamma_inv
    }

    /// Residual (non-skewed) covariance `Ψ̄ = Σ − ΔΓ⁻¹Δᵀ`.
    pub fn psi_bar(&self) -> &Matrix {
        &self.psi_bar
    }
}

/// Derive the posterior for a prior and comparison list.
///
/// Convenience front door for [`Posterior::infer`].
pub fn infer(
    prior: &GaussianPrior,
    comparisons: &[Comparison],
    config: &Config,
) -> Result<Posterior> {
    Posterior::infer(prior, comparisons, config)
}

/// Average the off-diagonal pairs; subtractive updates can break symmetry
/// at the last few bits and the Cholesky path needs it exact.
fn symmetrize(matrix: &mut Matrix) {
    let n = matrix.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (matrix[(i, j)] + matrix[(j, i)]);
            matrix[(i, j)] = avg;
            matrix[(j, i)] = avg;
        }
    }
}

/// Escalating diagonal jitter for the factorization of `Ψ̄`, which is
/// positive definite in exact arithmetic but can sit at the PSD margin in
/// floating point.
fn factor_with_jitter(psi_bar: &Matrix) -> Result<Matrix> {
    let n = psi_bar.nrows();
    let scale = psi_bar
        .diagonal()
        .iter()
        .fold(0.0_f64, |acc, &v| acc.max(v.abs()))
        .max(1.0);
    for &jitter in &[0.0, 1e-12, 1e-10, 1e-8] {
        let mut candidate = psi_bar.clone();
        for i in 0..n {
            candidate[(i, i)] += jitter * scale;
        }
        if let Some(chol) = Cholesky::new(candidate) {
            if jitter > 0.0 {
                tracing::debug!(jitter, "residual covariance required diagonal jitter");
            }
            return Ok(chol.l());
        }
    }
    Err(Error::Numerical(
        "residual covariance Ψ̄ is not positive semi-definite".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn standard_setup(comparisons: &[Comparison]) -> Posterior {
        Posterior::infer(&GaussianPrior::standard(2), comparisons, &Config::new(1.0)).unwrap()
    }

    #[test]
    fn no_comparisons_reduce_to_the_prior() {
        let posterior = standard_setup(&[]);
        assert_eq!(posterior.n_comparisons(), 0);
        assert_eq!(posterior.gamma().nrows(), 0);
        assert_eq!(posterior.delta_gamma_inv().ncols(), 0);
        let drift = (posterior.psi_bar() - Matrix::identity(2, 2)).norm();
        assert!(drift < 1e-12, "Ψ̄ should equal the prior covariance");
    }

    #[test]
    fn single_comparison_matrices_match_hand_computation() {
        // n = 2, μ = 0, Σ = I, β = 1, D = [1 −1]:
        // Δ = [1, −1]ᵀ, Γ = [3], ΔΓ⁻¹ = [1/3, −1/3]ᵀ,
        // Ψ̄ = [[2/3, 1/3], [1/3, 2/3]].
        let posterior = standard_setup(&[Comparison::new(0, 1)]);
        assert_relative_eq!(posterior.delta()[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(posterior.delta()[(1, 0)], -1.0, epsilon = 1e-12);
        assert_relative_eq!(posterior.gamma()[(0, 0)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(posterior.delta_gamma_inv()[(0, 0)], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(posterior.delta_gamma_inv()[(1, 0)], -1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(posterior.psi_bar()[(0, 0)], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(posterior.psi_bar()[(0, 1)], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn probit_scale_enters_gamma() {
        let config = Config::new(2.0);
        let posterior = Posterior::infer(
            &GaussianPrior::standard(2),
            &[Comparison::new(0, 1)],
            &config,
        )
        .unwrap();
        // Γ = 1/β² + dᵀΣd = 0.25 + 2.
        assert_relative_eq!(posterior.gamma()[(0, 0)], 2.25, epsilon = 1e-12);
    }

    #[test]
    fn empty_prior_is_a_numerical_error() {
        let result = Posterior::infer(&GaussianPrior::standard(0), &[], &Config::new(1.0));
        assert!(matches!(result, Err(Error::Numerical(_))));
    }

    #[test]
    fn singular_prior_is_a_numerical_error() {
        let prior = GaussianPrior::new(Vector::zeros(2), Matrix::zeros(2, 2)).unwrap();
        let result = Posterior::infer(&prior, &[], &Config::new(1.0));
        assert!(matches!(result, Err(Error::Numerical(_))));
    }

    #[test]
    fn bad_probit_scale_is_invalid_input() {
        for beta in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result =
                Posterior::infer(&GaussianPrior::standard(2), &[], &Config::new(beta));
            assert!(
                matches!(result, Err(Error::InvalidInput(_))),
                "β = {beta} should be rejected"
            );
        }
    }

    #[test]
    fn bad_comparison_is_invalid_input() {
        let result = Posterior::infer(
            &GaussianPrior::standard(2),
            &[Comparison::new(0, 5)],
            &Config::new(1.0),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn sampling_is_deterministic_under_a_fixed_seed() {
        let posterior = standard_setup(&[Comparison::new(0, 1)]);
        let mut rng_a = Xoshiro256PlusPlus::seed_from_u64(99);
        let mut rng_b = Xoshiro256PlusPlus::seed_from_u64(99);
        let a = posterior.sample(50, &mut rng_a).unwrap();
        let b = posterior.sample(50, &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sample_shape_is_items_by_count() {
        let posterior = standard_setup(&[Comparison::new(1, 0)]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let samples = posterior.sample(33, &mut rng).unwrap();
        assert_eq!(samples.nrows(), 2);
        assert_eq!(samples.ncols(), 33);
    }
}

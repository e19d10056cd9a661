//! Minimax-tilting preprocessing for truncated-normal sampling and CDF
//! estimation.
//!
//! Implements the setup stage of Botev's method (doi:10.1111/rssb.12162):
//! a Cholesky factorization with variables reordered by smallest
//! conditional probability, followed by a Gauss-Newton solve of the
//! saddlepoint system that yields the optimal exponential tilting of the
//! sequential proposal. The resulting [`TiltedProposal`] is reusable: it
//! is built once per truncation region and then drives any number of
//! proposal draws, each carrying its log importance weight.

use argmin::core::Error as SolverError;
use argmin::core::{Executor, Jacobian, Operator};
use argmin::solver::gaussnewton::GaussNewton;
use ordered_float::OrderedFloat;
use rand::Rng;

use crate::error::{Error, Result};
use crate::types::{Matrix, Vector};

use super::normal::{ln_trunc_prob, trunc_std_normal};

/// Iteration cap for the Gauss-Newton saddlepoint solve.
const SOLVER_MAX_ITERS: u64 = 100;

/// A truncation region `[lower, upper]` of `N(0, Σ)` preprocessed for
/// tilted sequential sampling.
///
/// All vectors and factors are stored in the permuted, pivot-scaled
/// coordinate system; [`TiltedProposal::draw`] produces draws in that
/// system together with their log importance weights, and callers map
/// them back through `chol` and `perm`.
#[derive(Debug, Clone)]
pub(crate) struct TiltedProposal {
    /// Permuted lower Cholesky factor of the covariance.
    pub chol: Matrix,
    /// Unit-diagonal factor minus the identity (strictly lower part used
    /// by the sequential conditioning).
    pub chol_unit: Matrix,
    /// Lower bounds scaled by the Cholesky pivots, in permuted order.
    pub lower: Vector,
    /// Upper bounds scaled by the Cholesky pivots, in permuted order.
    pub upper: Vector,
    /// Permutation applied to the variables: output row `perm[i]` holds
    /// permuted row `i`.
    pub perm: Vec<usize>,
    /// Tilting parameters μ* (d−1 components; the last is pinned at 0).
    pub tilt: Vector,
    /// ψ(x*, μ*): log of the accept-reject envelope and the anchor of
    /// every importance weight.
    pub log_envelope: f64,
}

impl TiltedProposal {
    /// Build the proposal for `N(0, cov)` restricted to `[lower, upper]`.
    ///
    /// Requires dimension ≥ 2; the univariate and empty cases never need
    /// tilting and are handled by the callers directly.
    pub fn new(cov: &Matrix, lower: &Vector, upper: &Vector) -> Result<Self> {
        let d = lower.len();
        debug_assert!(d >= 2, "tilting requires dimension >= 2");

        let (chol, mut lower_s, mut upper_s, perm) = ordered_cholesky(cov, lower, upper);

        let diag = chol.diagonal();
        if diag.iter().any(|&v| v < f64::EPSILON) {
            tracing::warn!("truncation covariance is numerically singular");
        }

        let mut chol_unit = chol.clone();
        for i in 0..d {
            chol_unit.row_mut(i).scale_mut(1.0 / diag[i]);
        }
        lower_s.component_div_assign(&diag);
        upper_s.component_div_assign(&diag);
        chol_unit -= Matrix::identity(d, d);

        let system = SaddlepointSystem {
            lower: lower_s.clone(),
            upper: upper_s.clone(),
            chol_unit: chol_unit.clone(),
        };

        let init = Vector::zeros(2 * (d - 1));
        let solver: GaussNewton<f64> = GaussNewton::new();
        let outcome = Executor::new(system.clone(), solver)
            .configure(|state| state.param(init).max_iters(SOLVER_MAX_ITERS))
            .run()
            .map_err(|e| Error::ResourceUnavailable(format!("tilting solver failed: {e}")))?;
        let solution = outcome.state.best_param.ok_or_else(|| {
            Error::ResourceUnavailable("tilting solver produced no solution".into())
        })?;

        let (x_star, tilt) = system.split(&solution);
        let log_envelope = system.log_weight_at(&x_star, &tilt);
        if !log_envelope.is_finite() {
            return Err(Error::Numerical(
                "tilting envelope is not finite; truncation region has no usable mass".into(),
            ));
        }

        Ok(Self {
            chol,
            chol_unit,
            lower: lower_s,
            upper: upper_s,
            perm,
            tilt,
            log_envelope,
        })
    }

    /// Draw `count` vectors from the tilted sequential proposal.
    ///
    /// Returns the per-draw log importance weights and the draws in the
    /// permuted, pivot-scaled coordinate system (one column per draw).
    pub fn draw<R: Rng>(&self, count: usize, rng: &mut R) -> (Vector, Matrix) {
        let d = self.lower.len();
        let mut draws = Matrix::zeros(d, count);
        let mut log_weights = Vector::zeros(count);
        let mut mu_full = Vector::zeros(d);
        mu_full.rows_mut(0, d - 1).copy_from(&self.tilt);

        for k in 0..d {
            for i in 0..count {
                let shift: f64 = (0..k).map(|j| self.chol_unit[(k, j)] * draws[(j, i)]).sum();
                let tl = self.lower[k] - mu_full[k] - shift;
                let tu = self.upper[k] - mu_full[k] - shift;
                draws[(k, i)] = mu_full[k] + trunc_std_normal(rng, tl, tu);
                log_weights[i] +=
                    ln_trunc_prob(tl, tu) + 0.5 * mu_full[k] * mu_full[k] - mu_full[k] * draws[(k, i)];
            }
        }
        (log_weights, draws)
    }
}

/// The saddlepoint system ∇ψ(x, μ) = 0 whose solution fixes the tilting.
///
/// The variable vector stacks x (first d−1 components of the draw path)
/// and μ (the tilting parameters); the final component of each is pinned
/// at zero, which is why the system has dimension 2(d−1).
#[derive(Clone)]
struct SaddlepointSystem {
    lower: Vector,
    upper: Vector,
    chol_unit: Matrix,
}

impl SaddlepointSystem {
    /// Split the stacked solver variable into `(x, μ)`.
    fn split(&self, y: &Vector) -> (Vector, Vector) {
        let d = self.lower.len();
        let mut x = Vector::zeros(d - 1);
        let mut mu = Vector::zeros(d - 1);
        x.copy_from(&y.rows(0, d - 1));
        mu.copy_from(&y.rows(d - 1, d - 1));
        (x, mu)
    }

    /// ψ(x, μ): the log importance weight along the deterministic path x
    /// under tilting μ. Its saddlepoint value is the rejection envelope.
    fn log_weight_at(&self, x: &Vector, mu: &Vector) -> f64 {
        let d = self.lower.len();
        let mut x_full = Vector::zeros(d);
        let mut mu_full = Vector::zeros(d);
        x_full.rows_mut(0, d - 1).copy_from(x);
        mu_full.rows_mut(0, d - 1).copy_from(mu);

        let shift = &self.chol_unit * &x_full;
        let tl = &self.lower - &mu_full - &shift;
        let tu = &self.upper - &mu_full - &shift;
        let tail_terms: f64 = (0..d)
            .map(|i| ln_trunc_prob(tl[i], tu[i]) + 0.5 * mu_full[i] * mu_full[i])
            .sum();
        tail_terms - x_full.dot(&mu_full)
    }

    /// Gradient of ψ, optionally with its Jacobian.
    fn grad(&self, x: &Vector, mu: &Vector, with_jacobian: bool) -> (Vector, Option<Matrix>) {
        let d = self.lower.len();
        let mut x_full = Vector::zeros(d);
        let mut mu_full = Vector::zeros(d);
        x_full.rows_mut(0, d - 1).copy_from(x);
        mu_full.rows_mut(0, d - 1).copy_from(mu);

        // Row 0 of the unit factor is zero, so the conditioning shift
        // only affects rows 1..d.
        let mut shift = Vector::zeros(d);
        shift
            .rows_mut(1, d - 1)
            .copy_from(&(&self.chol_unit.rows(1, d - 1) * &x_full));

        let tl = &self.lower - &mu_full - &shift;
        let tu = &self.upper - &mu_full - &shift;
        let log_mass = Vector::from_iterator(d, (0..d).map(|i| ln_trunc_prob(tl[i], tu[i])));
        let density_l = Vector::from_iterator(
            d,
            (0..d).map(|i| {
                (-0.5 * tl[i] * tl[i] - log_mass[i]).exp() / (2.0 * std::f64::consts::PI).sqrt()
            }),
        );
        let density_u = Vector::from_iterator(
            d,
            (0..d).map(|i| {
                (-0.5 * tu[i] * tu[i] - log_mass[i]).exp() / (2.0 * std::f64::consts::PI).sqrt()
            }),
        );
        let density_diff = &density_l - &density_u;

        let grad_x = -mu_full.rows(0, d - 1)
            + self.chol_unit.columns(0, d - 1).transpose() * &density_diff;
        let grad_mu = (&mu_full - &x_full + &density_diff).rows(0, d - 1).into_owned();

        let mut grad = Vector::zeros(2 * (d - 1));
        grad.rows_mut(0, d - 1).copy_from(&grad_x);
        grad.rows_mut(d - 1, d - 1).copy_from(&grad_mu);

        if !with_jacobian {
            return (grad, None);
        }

        // Infinite bounds contribute no boundary density; zero them so
        // the products below stay finite.
        let tl_finite = Vector::from_iterator(
            d,
            tl.iter().map(|&v| if v.is_infinite() { 0.0 } else { v }),
        );
        let tu_finite = Vector::from_iterator(
            d,
            tu.iter().map(|&v| if v.is_infinite() { 0.0 } else { v }),
        );
        let dp = -density_diff.component_mul(&density_diff)
            + tl_finite.component_mul(&density_l)
            - tu_finite.component_mul(&density_u);
        let dl = Matrix::from_diagonal(&dp) * &self.chol_unit;
        let mx = &dl - Matrix::identity(d, d);
        let xx = self.chol_unit.transpose() * &dl;

        let k = d - 1;
        let mut jacobian = Matrix::zeros(2 * k, 2 * k);
        jacobian
            .view_mut((0, 0), (k, k))
            .copy_from(&xx.view((0, 0), (k, k)));
        jacobian
            .view_mut((0, k), (k, k))
            .copy_from(&mx.view((0, 0), (k, k)));
        jacobian
            .view_mut((k, 0), (k, k))
            .copy_from(&mx.view((0, 0), (k, k)));
        for i in 0..k {
            jacobian[(k + i, k + i)] = 1.0 + dp[i];
        }
        (grad, Some(jacobian))
    }
}

impl Operator for SaddlepointSystem {
    type Param = Vector;
    type Output = Vector;

    fn apply(&self, y: &Self::Param) -> std::result::Result<Self::Output, SolverError> {
        let (x, mu) = self.split(y);
        let (grad, _) = self.grad(&x, &mu, false);
        Ok(grad)
    }
}

impl Jacobian for SaddlepointSystem {
    type Param = Vector;
    type Jacobian = Matrix;

    fn jacobian(&self, y: &Self::Param) -> std::result::Result<Self::Jacobian, SolverError> {
        let (x, mu) = self.split(y);
        let (_, jacobian) = self.grad(&x, &mu, true);
        Ok(jacobian.expect("jacobian requested"))
    }
}

/// Cholesky factorization with greedy variable reordering.
///
/// At each pivot the remaining variable with the smallest conditional
/// truncation probability is processed next; this ordering keeps the
/// sequential proposal's acceptance rate high. Returns the permuted
/// factor, permuted bounds, and the permutation itself.
fn ordered_cholesky(
    cov: &Matrix,
    lower: &Vector,
    upper: &Vector,
) -> (Matrix, Vector, Vector, Vec<usize>) {
    let d = lower.len();
    let mut sig = cov.clone();
    let mut l = lower.clone();
    let mut u = upper.clone();
    let mut perm: Vec<usize> = (0..d).collect();
    let mut factor = Matrix::zeros(d, d);
    let mut z = Vector::zeros(d);

    for j in 0..d {
        // Score every remaining candidate by its conditional log mass.
        let mut score = Vector::from_element(d, f64::INFINITY);
        for i in j..d {
            let s = sig[(i, i)] - (0..j).map(|k| factor[(i, k)].powi(2)).sum::<f64>();
            let s_sqrt = if s < 0.0 { f64::EPSILON.sqrt() } else { s.sqrt() };
            let tl = (l[i] - (0..j).map(|k| factor[(i, k)] * z[k]).sum::<f64>()) / s_sqrt;
            let tu = (u[i] - (0..j).map(|k| factor[(i, k)] * z[k]).sum::<f64>()) / s_sqrt;
            score[i] = ln_trunc_prob(tl, tu);
        }
        let pivot = (j..d)
            .min_by_key(|&i| OrderedFloat(score[i]))
            .expect("non-empty candidate range");

        sig.swap_rows(j, pivot);
        sig.swap_columns(j, pivot);
        factor.swap_rows(j, pivot);
        l.swap_rows(j, pivot);
        u.swap_rows(j, pivot);
        perm.swap(j, pivot);

        let s = sig[(j, j)] - (0..j).map(|k| factor[(j, k)].powi(2)).sum::<f64>();
        let s = if s < 0.0 { f64::EPSILON } else { s };
        factor[(j, j)] = s.sqrt();
        for i in (j + 1)..d {
            factor[(i, j)] = (sig[(i, j)]
                - (0..j).map(|k| factor[(i, k)] * factor[(j, k)]).sum::<f64>())
                / factor[(j, j)];
        }

        let tl = (l[j] - (0..j).map(|k| factor[(j, k)] * z[k]).sum::<f64>()) / factor[(j, j)];
        let tu = (u[j] - (0..j).map(|k| factor[(j, k)] * z[k]).sum::<f64>()) / factor[(j, j)];
        let w = ln_trunc_prob(tl, tu);
        z[j] = ((-0.5 * tl * tl - w).exp() - (-0.5 * tu * tu - w).exp())
            / (2.0 * std::f64::consts::PI).sqrt();
    }
    (factor, l, u, perm)
}

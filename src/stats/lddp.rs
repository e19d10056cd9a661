//! Posterior informativeness relative to the prior.
//!
//! The LDDP is the negative KL divergence of the posterior from the
//! prior under the probit likelihood:
//!
//! ```text
//! lddp = ln Z − E_post[ln Φ_m(βDx; I)]
//! ln Z = ln Φ_m(Dμ; Γ)
//! ```
//!
//! The expectation term factorizes into univariate `ln Φ` because its
//! covariance is the identity; the normalization constant needs the full
//! m-dimensional CDF estimator. Everything stays in log space so
//! moderate-to-large `m` does not underflow.

use rand::Rng;

use crate::error::{Error, Result};
use crate::model::Posterior;
use crate::mvn::{ln_normal_cdf, log_mvn_cdf};
use crate::types::Matrix;

/// Estimate the LDDP on a given posterior sample batch.
///
/// `samples` is `n×k`, one draw per column. Returns `0.0` for an empty
/// comparison list (posterior equals prior). An orthant-estimator
/// failure propagates as [`Error::Numerical`]: the metric is reported
/// unavailable rather than silently substituted.
pub fn lddp<R: Rng>(posterior: &Posterior, samples: &Matrix, rng: &mut R) -> Result<f64> {
    let n = posterior.n_items();
    if samples.nrows() != n {
        return Err(Error::InvalidInput(format!(
            "sample batch has {} rows, expected {n}",
            samples.nrows()
        )));
    }
    let k = samples.ncols();
    if k == 0 {
        return Err(Error::InvalidInput(
            "divergence estimation needs at least one sample column".into(),
        ));
    }
    let m = posterior.n_comparisons();
    if m == 0 {
        return Ok(0.0);
    }

    let beta = posterior.probit_scale();
    let design = posterior.design();

    let shift = design * posterior.prior().mean();
    let log_z = log_mvn_cdf(
        &shift,
        posterior.gamma(),
        posterior.config().orthant_draws,
        rng,
    )?;

    let margins = design * samples;
    let mut expected = 0.0;
    for s in 0..k {
        for c in 0..m {
            expected += ln_normal_cdf(beta * margins[(c, s)]);
        }
    }
    expected /= k as f64;

    let value = log_z - expected;
    if !value.is_finite() {
        return Err(Error::Numerical("divergence estimate is not finite".into()));
    }
    Ok(value)
}

/// Draw a fresh batch from the posterior and estimate the LDDP on it.
pub fn lddp_fresh<R: Rng>(posterior: &Posterior, count: usize, rng: &mut R) -> Result<f64> {
    let samples = posterior.sample(count, rng)?;
    lddp(posterior, &samples, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::prior::GaussianPrior;
    use crate::types::Comparison;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn empty_history_has_zero_divergence() {
        let posterior =
            Posterior::infer(&GaussianPrior::standard(3), &[], &Config::new(1.0)).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let value = lddp_fresh(&posterior, 100, &mut rng).unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn informative_history_has_negative_divergence() {
        let posterior = Posterior::infer(
            &GaussianPrior::standard(2),
            &[Comparison::new(0, 1)],
            &Config::new(1.0),
        )
        .unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let value = lddp_fresh(&posterior, 2000, &mut rng).unwrap();
        assert!(value.is_finite());
        assert!(value < 0.0, "negative KL should be negative, got {value}");
    }

    #[test]
    fn divergence_grows_with_evidence() {
        // Five repeats of the same judgment pull the posterior further
        // from the prior than one.
        let config = Config::new(1.0);
        let prior = GaussianPrior::standard(2);
        let one = Posterior::infer(&prior, &[Comparison::new(0, 1)], &config).unwrap();
        let five =
            Posterior::infer(&prior, &vec![Comparison::new(0, 1); 5], &config).unwrap();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let d_one = lddp_fresh(&one, 2000, &mut rng).unwrap();
        let d_five = lddp_fresh(&five, 2000, &mut rng).unwrap();
        assert!(
            d_five < d_one,
            "more evidence should diverge further: {d_five} vs {d_one}"
        );
    }

    #[test]
    fn mismatched_batch_shape_is_invalid() {
        let posterior = Posterior::infer(
            &GaussianPrior::standard(2),
            &[Comparison::new(0, 1)],
            &Config::new(1.0),
        )
        .unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let samples = Matrix::zeros(3, 10);
        assert!(matches!(
            lddp(&posterior, &samples, &mut rng),
            Err(Error::InvalidInput(_))
        ));
    }
}

//! Scalar normal-distribution helpers shared by the truncated sampler and
//! the CDF estimator.
//!
//! Everything here is written to stay finite in log space: the deep tails
//! of Φ underflow long before the session sizes this crate targets become
//! interesting, so tail quantities go through the scaled complementary
//! error function instead of Φ directly.

use std::f64::consts::{LN_2, PI, SQRT_2};

use rand::Rng;
use rand_distr::StandardNormal;
use statrs::function::erf::{erfc, erfc_inv};

/// Φ(x), the standard normal CDF.
pub(crate) fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// ln Φ(x), stable in the deep lower tail.
pub(crate) fn ln_normal_cdf(x: f64) -> f64 {
    ln_normal_sf(-x)
}

/// ln P(Z > x), the log survival function.
pub(crate) fn ln_normal_sf(x: f64) -> f64 {
    if x <= -8.0 {
        // 1 − Φ(−x) with Φ(−x) ≤ 1e-15: ln(1 − ε) via ln_1p.
        return (-ln_normal_sf(-x).exp()).ln_1p();
    }
    -0.5 * x * x - LN_2 + erfcx(x / SQRT_2).ln()
}

/// Scaled complementary error function `exp(x²)·erfc(x)`.
///
/// Direct evaluation overflows past x ≈ 26; switch to the asymptotic
/// expansion there.
pub(crate) fn erfcx(x: f64) -> f64 {
    if x < 25.0 {
        (x * x).exp() * erfc(x)
    } else {
        let inv2 = 1.0 / (x * x);
        (1.0 - 0.5 * inv2 * (1.0 - 1.5 * inv2)) / (x * PI.sqrt())
    }
}

/// ln P(a < Z < b) for standard normal Z, with infinite bounds accepted.
///
/// The three branches keep the subtraction of nearly equal tail masses in
/// log space; only the central branch works with raw probabilities.
pub(crate) fn ln_trunc_prob(a: f64, b: f64) -> f64 {
    if a > 0.0 {
        let pa = ln_normal_sf(a);
        let pb = ln_normal_sf(b);
        pa + (-(pb - pa).exp()).ln_1p()
    } else if b < 0.0 {
        let pa = ln_normal_sf(-a);
        let pb = ln_normal_sf(-b);
        pb + (-(pa - pb).exp()).ln_1p()
    } else {
        let below = 0.5 * erfc(-a / SQRT_2);
        let above = 0.5 * erfc(b / SQRT_2);
        (1.0 - below - above).ln()
    }
}

/// Threshold beyond which one-sided truncations use tail sampling.
const TAIL_CROSSOVER: f64 = 0.66;

/// Box width below which the central regime uses inverse-CDF sampling.
const NARROW_BOX: f64 = 2.0;

/// Draw from the standard normal truncated to `[l, u]`.
///
/// Three-regime scheme: Rayleigh accept-reject past the tail crossover,
/// inverse-CDF transform for narrow central boxes, plain rejection from
/// the untruncated normal otherwise.
pub(crate) fn trunc_std_normal<R: Rng>(rng: &mut R, l: f64, u: f64) -> f64 {
    if l > TAIL_CROSSOVER {
        tail(rng, l, u)
    } else if u < -TAIL_CROSSOVER {
        -tail(rng, -u, -l)
    } else if (u - l).abs() > NARROW_BOX {
        reject_normal(rng, l, u)
    } else {
        let pl = 0.5 * erfc(l / SQRT_2);
        let pu = 0.5 * erfc(u / SQRT_2);
        SQRT_2 * erfc_inv(2.0 * (pl - (pl - pu) * rng.random::<f64>()))
    }
}

/// Rejection from the untruncated normal; acceptance is bounded away from
/// zero because the box is central and wide.
fn reject_normal<R: Rng>(rng: &mut R, l: f64, u: f64) -> f64 {
    loop {
        let x: f64 = rng.sample(StandardNormal);
        if x >= l && x <= u {
            return x;
        }
    }
}

/// Rayleigh accept-reject for the right tail `l > TAIL_CROSSOVER`.
fn tail<R: Rng>(rng: &mut R, l: f64, u: f64) -> f64 {
    let c = 0.5 * l * l;
    let f = (c - 0.5 * u * u).exp_m1();
    loop {
        let x = c - (1.0 + rng.random::<f64>() * f).ln();
        if rng.random::<f64>().powi(2) * x <= c {
            return (2.0 * x).sqrt();
        }
    }
}

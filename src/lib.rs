//! # sunrank
//!
//! Bayesian inference of a latent score distribution from pairwise
//! "A beats B" judgments, with active selection of the next most
//! informative comparison.
//!
//! Under the Thurstonian model every item carries a latent continuous
//! score; a recorded judgment is a noisy probit sign reading of the
//! score difference, with the probit scale β controlling how
//! deterministic outcomes are. Given a Gaussian prior and `m` judgments,
//! the exact posterior is a unified skew-normal (SUN) distribution:
//! a Gaussian component plus a box-truncated Gaussian pushed through a
//! linear map. This crate constructs it, samples from it exactly,
//! ranks candidate next comparisons by informativeness, and estimates
//! how far the posterior has moved from the prior.
//!
//! ## Quick start
//!
//! ```ignore
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//! use sunrank::{stats, Comparison, Config, Session};
//!
//! let mut session = Session::new(
//!     vec!["apple".into(), "banana".into(), "cherry".into()],
//!     1.0,
//! )?;
//! session.record(Comparison::new(0, 1))?; // apple beat banana
//!
//! let config = Config::new(3.0);
//! let posterior = session.posterior(&config)?;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
//! let samples = posterior.sample(1_000, &mut rng)?;
//! let means = stats::posterior_mean(&samples)?;
//! let next = stats::comparison_entropy(&samples, config.probit_scale)?;
//! println!("ask about {:?} next", next.max_entropy_pair);
//! # Ok::<(), sunrank::Error>(())
//! ```
//!
//! ## Structure
//!
//! - [`model`]: design matrix and the SUN posterior (construction and
//!   exact sampling).
//! - [`stats`]: Monte-Carlo entropy and skewness-norm query selection,
//!   the LDDP informativeness estimate, and display summaries.
//! - [`mvn`]: the numerical primitives behind the model: a truncated
//!   multivariate-normal sampler and a log-scale CDF estimator.
//! - [`session`]: the caller-owned comparison log and its JSON exchange
//!   record.
//!
//! The core is single-threaded and synchronous; posterior values are
//! immutable snapshots, so callers may fan batch sampling out across
//! threads as long as each thread gets its own RNG. Rebuilding costs
//! `O(n³ + m³)` per round, which is comfortable for tens to low hundreds
//! of items and a documented scaling limit beyond that.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod prior;
mod types;

pub mod model;
pub mod mvn;
pub mod session;
pub mod stats;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{design_matrix, infer, Posterior};
pub use prior::GaussianPrior;
pub use session::Session;
pub use types::{Comparison, Matrix, Vector};

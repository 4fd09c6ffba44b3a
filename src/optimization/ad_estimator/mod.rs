//! ad_estimator — direct-effects estimation on an identified structural network.
//!
//! Purpose
//! -------
//! Estimate the free direct effects `(mx, my)` of a linear structural model
//! from centered data by minimizing a weighted least-squares objective with
//! Adam, using the crate's own reverse-mode engine for gradients.
//!
//! Key behaviors
//! -------------
//! - [`engine`]: the [`AutodiffEngine`] trait and [`StructuralNet`], which
//!   masks, inverts, and back-propagates through `ey = (I − my)⁻¹`,
//!   `ex = ey·mx`; Hessians over the free vector via [`sse_hess`].
//! - [`adam`]: Adam as an argmin solver with the epoch floor / convergence
//!   streak stop rule.
//! - [`run`]: [`estimate_snn`] wires the solver, an epoch cap, and a support
//!   guard that fails on any iterate with mass outside the identification
//!   pattern.
//! - [`options`]: validated [`EstimatorOptions`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The y-graph is acyclic (checked upstream by `model::adjacency`), so
//!   `I − my` is unit lower-triangular up to permutation and invertible.
//! - Starting values vanish outside the support; masking on every forward
//!   pass and re-masking on every backward pass keep them there.
//!
//! Conventions
//! -----------
//! - Full parameter `θ = [vec_F(my); vec_F(mx)]`, column-major.
//! - Free coefficients follow `effects::vectorize::directvec_alg`.
//!
//! Downstream usage
//! ----------------
//! - `model::estimate` builds a [`StructuralNet`] from a model setup, runs
//!   [`estimate_snn`] from the theoretical direct effects, then calls
//!   [`sse_hess`] for the covariance.
//!
//! Testing notes
//! -------------
//! - Gradient checks against finite differences live in [`engine`]; stop
//!   rule tests in [`adam`]; recovery and failure paths in [`run`].

pub mod adam;
pub mod engine;
pub mod options;
pub mod run;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::engine::{AutodiffEngine, NetCache, StructuralNet, sse_hess};
pub use self::options::EstimatorOptions;
pub use self::run::{SnnOutcome, estimate_snn};

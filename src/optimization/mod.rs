//! optimization — estimators, minimizers, and the unified error surface.
//!
//! Purpose
//! -------
//! Provide the numerical machinery behind effect estimation: an Adam-based
//! estimator of direct effects with its own reverse-mode gradients, a
//! general argmin-backed minimizer for scalar objectives such as the bias
//! SSE, and the linear-algebra helpers both rely on.
//!
//! Key behaviors
//! -------------
//! - `ad_estimator`: `StructuralNet`, the Adam solver with its epoch-floor
//!   and convergence-streak stop rule, `estimate_snn`, and `sse_hess`.
//! - `minimizer`: `minimize` over an [`minimizer::Objective`] with BFGS
//!   (More–Thuente line search) or Nelder–Mead, finite-difference gradient
//!   fallback, and `numerical_hessian`.
//! - `numerical_stability`: checked inversion, symmetric pseudoinverse,
//!   relative accuracy.
//! - `errors`: [`errors::OptError`] and the `OptResult<T>` alias.
//!
//! Invariants & assumptions
//! ------------------------
//! - Invalid states are reported as `OptError`, never as panics.
//! - Errors raised inside argmin callbacks travel as `anyhow::Error` and
//!   are downcast back to `OptError` at the boundary.
//!
//! Conventions
//! -----------
//! - Parameters, gradients, and Hessians use the `ndarray` aliases `Theta`,
//!   `Grad`, and `Hessian`.
//! - All solvers minimize.
//!
//! Downstream usage
//! ----------------
//! - `model::estimate` uses `ad_estimator`; `model::bias` uses `minimizer`.
//! - Front-ends import the curated surface via `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests live in each submodule: gradient checks against finite
//!   differences, the stop rule, solver wiring, tolerance validation, and
//!   pseudoinverse behavior on rank-deficient inputs.

pub mod ad_estimator;
pub mod errors;
pub mod minimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_causal::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::ad_estimator::{EstimatorOptions, SnnOutcome, StructuralNet, estimate_snn};
    pub use super::errors::{OptError, OptResult};
    pub use super::minimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}

//! minimizer — argmin-powered minimization of scalar objectives.
//!
//! Purpose
//! -------
//! Provide a small, Argmin-backed layer for **minimizing** sum-of-squares
//! style objectives `c(θ)`. Callers implement a single trait,
//! [`Objective`], and invoke [`minimize`] to run BFGS (with an inverse-
//! Hessian estimate) or Nelder–Mead, with finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Expose objectives to Argmin via [`adapter::ArgMinAdapter`] without any
//!   sign change.
//! - Validate the starting point with [`Objective::check`], build the solver
//!   in [`builders`], run it in [`run`], and normalize results into a
//!   [`MinimizeOutcome`].
//! - Provide finite-difference gradients, Jacobians, and Hessians in
//!   [`finite_diff`] with error capture and post-hoc validation.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`Objective::value`] and [`Objective::grad`] report invalid inputs as
//!   [`OptError`](crate::optimization::errors::OptError) values, not panics.
//! - Configuration types ([`Tolerances`], [`MinimizerOptions`]) are validated
//!   on construction.
//!
//! Conventions
//! -----------
//! - Parameters are [`Theta`] (`Array1<f64>`); costs are [`Cost`] (`f64`).
//! - Errors bubble up as `OptResult<T>`; nothing here intentionally panics.
//!
//! Downstream usage
//! ----------------
//! - `model::bias` minimizes the scalar bias objective with [`minimize`] and
//!   reads the inverse Hessian from the outcome.
//! - `optimization::ad_estimator` and `inference::delta` reuse
//!   [`finite_diff`] for Hessians and Jacobians.
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule cover sign conventions, FD fallbacks,
//!   builder wiring, validation, and end-to-end runs on quadratic bowls.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{minimize, numerical_hessian};
pub use self::traits::{Method, MinimizeOutcome, MinimizerOptions, Objective, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_causal::optimization::minimizer::prelude::*;
//
// to import the main minimizer surface in a single line.

pub mod prelude {
    pub use super::api::{minimize, numerical_hessian};
    pub use super::traits::{Method, MinimizeOutcome, MinimizerOptions, Objective, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}

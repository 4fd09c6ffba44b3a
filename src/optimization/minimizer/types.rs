//! minimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the general
//! minimizer and by the structural estimator, so the rest of the
//! optimization code stays agnostic to `ndarray` and Argmin generics.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients, Hessians,
//!   and scalar costs (`Theta`, `Grad`, `Hessian`, `Cost`).
//! - Provide a standard map type for Argmin function-evaluation counters
//!   (`FnEvalMap`).
//! - Expose pre-wired BFGS and Nelder–Mead solver aliases over the common
//!   `(Theta, Grad, Cost)` shapes.
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors and matrices are `ndarray` containers over `f64`.
//! - `Cost` is always the scalar being **minimized** (a sum of squares in
//!   this crate); no sign flips happen anywhere in the optimizer layer.
//!
//! Conventions
//! -----------
//! - `Hessian` is a dense `theta.len() × theta.len()` matrix when used, and
//!   also serves as the inverse-Hessian approximation carried by BFGS.
//!
//! Testing notes
//! -------------
//! - Type aliases and constants only; exercised by the surrounding modules.
use argmin::solver::{
    linesearch::MoreThuenteLineSearch, neldermead::NelderMead, quasinewton::BFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector `∇c(θ)`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Dense Hessian (or inverse-Hessian) matrix; `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value being minimized.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Initial edge length of the Nelder–Mead simplex along each axis.
pub const NELDER_MEAD_STEP: f64 = 1.0;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// BFGS solver wired to the More–Thuente line search.
pub type BfgsMoreThuente = BFGS<MoreThuenteLS, Cost>;

/// Derivative-free Nelder–Mead simplex solver.
pub type NelderMeadSolver = NelderMead<Theta, Cost>;

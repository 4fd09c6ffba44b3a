//! numerical_stability — dense linear algebra with explicit failure modes.
//!
//! Purpose
//! -------
//! Centralize the matrix operations whose numerical behavior matters to the
//! rest of the crate: checked inversion of `I − my`, the eigen-truncated
//! pseudoinverse behind coefficient covariances, and the scale-free
//! comparison of estimated against theoretical effects.
//!
//! Key behaviors
//! -------------
//! - `invert` returns `None` for singular or non-finite inputs instead of
//!   propagating `inf`/`NaN`.
//! - `sym_pseudo_inverse` drops eigen-directions with eigenvalues at or
//!   below [`EIGEN_EPS`], so rank-deficient Hessians yield zero variance
//!   along non-identified directions.
//!
//! Conventions
//! -----------
//! - Inputs and outputs are `ndarray` matrices; `nalgebra` is confined to
//!   [`linalg`].
//! - This module never logs.

pub mod linalg;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::linalg::{EIGEN_EPS, invert, relative_accuracy, sym_pseudo_inverse};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::linalg::{EIGEN_EPS, relative_accuracy};
}

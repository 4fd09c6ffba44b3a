//! inference — coefficient covariance and delta-method standard errors.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification for estimated direct
//! effects: a covariance matrix for the free coefficient vector built from
//! the Hessian of the estimation objective, and its propagation to the
//! identified total effects through the Jacobian of the effects algebra.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for degrees-of-freedom, dimension, and upstream
//!   failures.
//! - Build the coefficient covariance `2·σ̂²·H⁺` via
//!   [`coefficient_covariance`] and scatter its standard deviations into
//!   direct-effect matrices via [`compute_direct_std`].
//! - Propagate the covariance to total effects with [`total_effects_std`],
//!   using the closed-form Kronecker Jacobian [`jacobian_alg`] and
//!   cross-checking it against [`jacobian_num`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Covariance matrices are `qdim × qdim` over the free coefficient vector
//!   in `directvec_alg` order (`my` support first, then `mx`).
//! - The y-graph is acyclic, so diagonal total self-effects carry no
//!   uncertainty.
//! - All numerical routines return [`InferenceError`] on failure rather than
//!   panicking.
//!
//! Conventions
//! -----------
//! - A Jacobian mismatch is a diagnostic, not an error: it is returned as a
//!   [`JacobianCheck`] inside [`EffectsStd`] and logged at warn level.
//!
//! Downstream usage
//! ----------------
//! - `model::estimate` calls [`coefficient_covariance`] on the Hessian from
//!   `optimization::ad_estimator::sse_hess`, then [`total_effects_std`] and
//!   `effects::mediation::compute_mediation_std`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover covariance scaling and truncation, rejection paths,
//!   Jacobian agreement on a three-equation model, hand-derived Jacobian
//!   entries on a chain, and the zero diagonal of `ey_std`.

pub mod covariance;
pub mod delta;
pub mod errors;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::covariance::{
    VARIANCE_ROUNDOFF, coefficient_covariance, compute_direct_std, std_from_variances,
};
pub use self::delta::{
    EffectsStd, JACOBIAN_ATOL, JacobianCheck, compare_jacobians, jacobian_alg, jacobian_num,
    total_effects_std,
};
pub use self::errors::{InferenceError, InferenceResult};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use rust_causal::inference::prelude::*;` to
// import the primary inference surface in a single line.

pub mod prelude {
    pub use super::covariance::{coefficient_covariance, compute_direct_std};
    pub use super::delta::{EffectsStd, JacobianCheck, total_effects_std};
    pub use super::errors::{InferenceError, InferenceResult};
}

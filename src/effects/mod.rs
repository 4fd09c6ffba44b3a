//! effects — identification, vectorization, and the effects algebra.
//!
//! Purpose
//! -------
//! Provide the pure, allocation-per-call numeric core of the crate: given
//! direct-effect matrices `(mx, my)` of a structural model, compute total
//! effects, mediation effects on a final variable, the identification
//! patterns of all three, and the bijection between sparse coefficient
//! matrices and their free-parameter vector.
//!
//! Key behaviors
//! -------------
//! - `identification`: binary patterns `(idx, idy) → (edx, edy) → (fdx, fdy)`
//!   and the [`Identification`] bundle with support counts.
//! - `vectorize`: column-major support enumeration, `directvec_alg`,
//!   `directmat`, `vecmat`, and `total_from_direct`.
//! - `total`: `ey = (I − my)⁻¹`, `ex = ey·mx` with optional masking.
//! - `mediation`: `eyx`, `eyy` and their standard deviations.
//!
//! Invariants & assumptions
//! ------------------------
//! - `my` has a structurally zero diagonal; violations are errors, never
//!   silently corrected.
//! - Identification masks contain only `0.0` and `1.0`.
//! - Every function is a value-in/value-out computation with no shared state.
//!
//! Conventions
//! -----------
//! - Matrices are `ndarray::Array2<f64>`; `mx` is `n×m`, `my` is `n×n`, with
//!   `n` endogenous and `m` exogenous variables.
//! - Free-coefficient vectors list endogenous coefficients first, then
//!   exogenous ones, each in column-major order over its support.
//! - Fallible operations return [`EffectsResult<T>`].
//!
//! Downstream usage
//! ----------------
//! - `model::setup` computes theoretical effects and patterns.
//! - `optimization::ad_estimator` uses `support` for gradient gather/scatter.
//! - `inference::delta` differentiates `total_from_direct`.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule and cover the round-trip,
//!   inverse, normalization, mediation, and pattern properties.

pub mod errors;
pub mod identification;
pub mod mediation;
pub mod total;
pub mod vectorize;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{EffectsError, EffectsResult};
pub use self::identification::{Identification, compute_ed, compute_fd, digital};
pub use self::mediation::{
    MediationEffects, MediationStd, compute_mediation_effects, compute_mediation_std,
};
pub use self::total::total_effects_alg;
pub use self::vectorize::{directmat, directvec_alg, total_from_direct, vecmat};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_causal::effects::prelude::*;
//
// to import the effects algebra in a single line.

pub mod prelude {
    pub use super::errors::{EffectsError, EffectsResult};
    pub use super::identification::{Identification, compute_ed, compute_fd};
    pub use super::mediation::{compute_mediation_effects, compute_mediation_std};
    pub use super::total::total_effects_alg;
    pub use super::vectorize::{directmat, directvec_alg, total_from_direct, vecmat};
}

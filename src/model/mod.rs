//! model — structural models from specification to estimated effects.
//!
//! Purpose
//! -------
//! Tie the effects algebra, the estimators, and the inference layer to a
//! concrete structural model: named variables, an equation system, and
//! observed data. This is the layer most callers use.
//!
//! Key behaviors
//! -------------
//! - [`spec`]: [`ModelSpec`] with validated variable lists and settings.
//! - [`equations`]: the [`DifferentiableModel`] capability and
//!   [`LinearEquations`].
//! - [`adjacency`]: [`Adjacency`] with identification masks, topological
//!   solve order, the numeric model, and direct effects.
//! - [`data`]: [`ObservedData`] with missing-value filtering, centering,
//!   and residual weights.
//! - [`setup`]: [`create_model`] and the theoretical effects.
//! - [`estimate`]: [`estimate_effects`] and the [`Estimates`] bundle.
//! - [`bias`]: [`optimize_bias`] / [`estimate_biases`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The endogenous dependency graph is acyclic and has no self-loops;
//!   [`Adjacency::new`] rejects anything else.
//! - Matrices are variables × observations; indices are 0-based positions
//!   in `yvars` / `xvars`.
//!
//! Downstream usage
//! ----------------
//! A typical run:
//! 1. `ModelSpec::new(..)` and `Adjacency::new(equations)`.
//! 2. `ObservedData::new(xdat, ymdat, &spec)`.
//! 3. `create_model(&spec, &adjacency, &data)` for theoretical effects.
//! 4. `estimate_effects(&spec, &setup, &data)` for estimates and standard
//!    deviations; optionally `estimate_biases`.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests on small hand-checked systems; the
//!   full pipeline on simulated data lives in `tests/`.

pub mod adjacency;
pub mod bias;
pub mod data;
pub mod equations;
pub mod errors;
pub mod estimate;
pub mod setup;
pub mod spec;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::adjacency::Adjacency;
pub use self::bias::{BiasEstimate, HessianSource, estimate_biases, optimize_bias, sse_bias};
pub use self::data::ObservedData;
pub use self::equations::{DifferentiableModel, LinearEquations};
pub use self::errors::{ModelError, ModelResult};
pub use self::estimate::{Estimates, estimate_effects, relative_accuracy};
pub use self::setup::{ModelSetup, TheoreticalEffects, create_model, theoretical_effects};
pub use self::spec::ModelSpec;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_causal::model::prelude::*;
//
// to import the model surface in a single line.

pub mod prelude {
    pub use super::adjacency::Adjacency;
    pub use super::bias::{BiasEstimate, HessianSource, estimate_biases, optimize_bias};
    pub use super::data::ObservedData;
    pub use super::equations::{DifferentiableModel, LinearEquations};
    pub use super::errors::{ModelError, ModelResult};
    pub use super::estimate::{Estimates, estimate_effects, relative_accuracy};
    pub use super::setup::{ModelSetup, create_model};
    pub use super::spec::ModelSpec;
}

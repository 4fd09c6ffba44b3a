//! Errors for structural models (specification, equations, observed data,
//! and the estimation pipeline).
//!
//! This module defines [`ModelError`], used by `model::spec`,
//! `model::adjacency`, `model::data`, `model::setup`, `model::bias`, and
//! `model::estimate`. Errors from the effects algebra, the optimizers, and
//! the inference layer are wrapped so the pipeline exposes one error type.
//!
//! ## Conventions
//! - **Indices are 0-based** and refer to positions in `yvars` / `xvars`.
//! - Observation matrices are variables × observations.
use crate::{
    effects::errors::EffectsError, inference::errors::InferenceError,
    optimization::errors::OptError,
};

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Unified error type for structural models.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Specification ----
    /// A variable list is empty.
    EmptyVariables { which: &'static str },

    /// A variable name appears twice.
    DuplicateVariable { name: String },

    /// A named variable is not part of the endogenous variables.
    UnknownVariable { name: String },

    /// Individual effects requested for more observations than available.
    InvalidShowNrIndiv { requested: usize, available: usize },

    /// Tikhonov weight must be finite and non-negative.
    InvalidAlpha { alpha: f64 },

    // ---- Equations ----
    /// An equation depends on its own left-hand side.
    SelfLoop { index: usize },

    /// The endogenous dependency graph has a cycle.
    Cyclic { remaining: Vec<usize> },

    /// Equation system dimensions differ from the specification.
    EquationDimMismatch { which: &'static str, expected: usize, found: usize },

    /// Bias target is not an equation index.
    InvalidBiasIndex { index: usize, ndim: usize },

    /// Numeric model produced a non-finite value.
    NonFiniteEvaluation { equation: usize },

    // ---- Observed data ----
    /// Rows of the manifest data differ from the number of manifest variables.
    ManifestDimMismatch { expected: usize, found: usize },

    /// Row count of exogenous data differs from the number of exogenous variables.
    ExogenousDimMismatch { expected: usize, found: usize },

    /// Exogenous and endogenous observation counts differ.
    ObservationMismatch { xobs: usize, yobs: usize },

    /// Exogenous data contains NaN/±inf.
    NonFiniteData { row: usize, col: usize },

    /// Fewer complete observations remain than were supplied.
    SampleSizeReduced { requested: usize, actual: usize },

    /// A manifest variable has zero variance and cannot be weighted.
    ZeroVariance { variable: String },

    // ---- Upstream layers ----
    Effects(EffectsError),
    Optimization(OptError),
    Inference(InferenceError),
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Specification ----
            ModelError::EmptyVariables { which } => {
                write!(f, "Variable list '{which}' must not be empty")
            }
            ModelError::DuplicateVariable { name } => {
                write!(f, "Variable '{name}' is declared more than once")
            }
            ModelError::UnknownVariable { name } => {
                write!(f, "Variable '{name}' is not an endogenous variable")
            }
            ModelError::InvalidShowNrIndiv { requested, available } => write!(
                f,
                "Individual effects requested for {requested} observations, only {available} available"
            ),
            ModelError::InvalidAlpha { alpha } => {
                write!(f, "Tikhonov weight alpha must be finite and non-negative, got {alpha}")
            }

            // ---- Equations ----
            ModelError::SelfLoop { index } => {
                write!(f, "Equation {index} depends on its own endogenous variable")
            }
            ModelError::Cyclic { remaining } => {
                write!(f, "Endogenous dependencies are cyclic among equations {remaining:?}")
            }
            ModelError::EquationDimMismatch { which, expected, found } => {
                write!(f, "Equation system has {found} {which}, expected {expected}")
            }
            ModelError::InvalidBiasIndex { index, ndim } => {
                write!(f, "Bias index {index} out of range for {ndim} equations")
            }
            ModelError::NonFiniteEvaluation { equation } => {
                write!(f, "Equation {equation} evaluated to a non-finite value")
            }

            // ---- Observed data ----
            ModelError::ManifestDimMismatch { expected, found } => write!(
                f,
                "Number of manifest yvars {expected} and ymdat rows {found} not identical"
            ),
            ModelError::ExogenousDimMismatch { expected, found } => {
                write!(f, "Number of xvars {expected} and xdat rows {found} not identical")
            }
            ModelError::ObservationMismatch { xobs, yobs } => {
                write!(f, "xdat has {xobs} observations but ymdat has {yobs}")
            }
            ModelError::NonFiniteData { row, col } => {
                write!(f, "Non-finite exogenous value at row {row}, column {col}")
            }
            ModelError::SampleSizeReduced { requested, actual } => write!(
                f,
                "Model observations reduced from {requested} to {actual} because of missing values"
            ),
            ModelError::ZeroVariance { variable } => {
                write!(f, "Manifest variable '{variable}' has zero variance")
            }

            // ---- Upstream layers ----
            ModelError::Effects(err) => write!(f, "{err}"),
            ModelError::Optimization(err) => write!(f, "{err}"),
            ModelError::Inference(err) => write!(f, "{err}"),
        }
    }
}

impl From<EffectsError> for ModelError {
    fn from(err: EffectsError) -> Self {
        ModelError::Effects(err)
    }
}

impl From<OptError> for ModelError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::Effects(inner) => ModelError::Effects(inner),
            other => ModelError::Optimization(other),
        }
    }
}

impl From<InferenceError> for ModelError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Effects(inner) => ModelError::Effects(inner),
            InferenceError::Optimization(inner) => ModelError::Optimization(inner),
            other => ModelError::Inference(other),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ModelError> for pyo3::PyErr {
    fn from(err: ModelError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

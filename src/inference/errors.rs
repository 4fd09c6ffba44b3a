//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type used by the
//! coefficient covariance and delta-method standard-error code. It groups
//! degrees-of-freedom and dimension failures with wrappers for errors from
//! the effects algebra and the optimization layer, plus an `anyhow` catch-all.
//! An alias `InferenceResult<T>` standardizes the return type.
use crate::{effects::errors::EffectsError, optimization::errors::OptError};

/// Unified error type for inference routines.
///
/// Integrates with `anyhow::Error` via `From`, and provides readable
/// diagnostics through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Covariance ----
    /// Residual variance needs more observations than free coefficients.
    InsufficientDegreesOfFreedom {
        nobs: usize,
        qdim: usize,
    },

    /// Hessian or covariance matrix does not match the coefficient count.
    CovarianceDimMismatch {
        expected: usize,
        found: (usize, usize),
    },

    /// Sum of squared errors must be finite and non-negative.
    InvalidSse {
        sse: f64,
    },

    /// Diagonal variance is non-finite or negative beyond rounding.
    InvalidVariance {
        index: usize,
        value: f64,
    },

    // ---- Upstream layers ----
    Effects(EffectsError),
    Optimization(OptError),

    // ---- Anyhow catchall ----
    Anyhow(String),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl From<anyhow::Error> for InferenceError {
    fn from(err: anyhow::Error) -> Self {
        InferenceError::Anyhow(err.to_string())
    }
}

impl From<EffectsError> for InferenceError {
    fn from(err: EffectsError) -> Self {
        InferenceError::Effects(err)
    }
}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::Effects(inner) => InferenceError::Effects(inner),
            other => InferenceError::Optimization(other),
        }
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Covariance ----
            InferenceError::InsufficientDegreesOfFreedom { nobs, qdim } => write!(
                f,
                "Inference Error: {nobs} observations leave no degrees of freedom for {qdim} coefficients"
            ),
            InferenceError::CovarianceDimMismatch { expected, found } => write!(
                f,
                "Inference Error: expected a ({expected}, {expected}) matrix, found {found:?}"
            ),
            InferenceError::InvalidSse { sse } => {
                write!(f, "Inference Error: invalid sum of squared errors {sse}")
            }
            InferenceError::InvalidVariance { index, value } => {
                write!(f, "Inference Error: invalid variance {value} at diagonal entry {index}")
            }

            // ---- Upstream layers ----
            InferenceError::Effects(err) => write!(f, "Inference Error: {err}"),
            InferenceError::Optimization(err) => write!(f, "Inference Error: {err}"),

            // ---- Anyhow catchall ----
            InferenceError::Anyhow(msg) => write!(f, "Inference Error: {}", msg),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<InferenceError> for pyo3::PyErr {
    fn from(err: InferenceError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

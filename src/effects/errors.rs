//! Unified error handling for the effects algebra.
//!
//! This module defines `EffectsError`, the error type shared by the
//! identification engine, the vectorization bijection, and the total and
//! mediation effect computations. Structural violations (self-loops,
//! shape mismatches) and numerical degeneracies (singular `I − my`) are
//! reported here; no routine in `effects` substitutes silent defaults
//! except the documented zero-column-sum case in mediation normalization.

/// Result alias for effects-algebra operations.
pub type EffectsResult<T> = Result<T, EffectsError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EffectsError {
    // ---- Structural violations ----
    /// Diagonal of `my` must be structurally zero (no self-effects).
    NotNormalized {
        index: usize,
        value: f64,
    },

    /// Two matrices that must be conformable are not.
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Free coefficient vector does not match the identified support size.
    DirectLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// Variable name not present in the endogenous variable list.
    UnknownVariable {
        name: String,
    },

    // ---- Numerical degeneracy ----
    /// `I − my` could not be inverted.
    SingularSystem {
        dim: usize,
    },
}

impl std::error::Error for EffectsError {}

impl std::fmt::Display for EffectsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Structural violations ----
            EffectsError::NotNormalized { index, value } => write!(
                f,
                "No normalization: diagonal element {index} of 'my' is {value}, must be zero"
            ),
            EffectsError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch for {what}: expected {expected:?}, found {found:?}")
            }
            EffectsError::DirectLengthMismatch { expected, found } => {
                write!(f, "Direct coefficient vector length mismatch: expected {expected}, found {found}")
            }
            EffectsError::UnknownVariable { name } => {
                write!(f, "Unknown endogenous variable '{name}'")
            }

            // ---- Numerical degeneracy ----
            EffectsError::SingularSystem { dim } => {
                write!(f, "Singular system: (I - my) of dimension {dim} is not invertible")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<EffectsError> for pyo3::PyErr {
    fn from(err: EffectsError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

use argmin::core::{ArgminError, Error};

use crate::effects::errors::EffectsError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- MinimizerOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid minimizer method name.
    InvalidMethod {
        name: String,
        reason: &'static str,
    },

    // ---- EstimatorOptions ----
    /// Relative SSE change tolerance needs to be positive and finite.
    InvalidRelTol {
        tol: f64,
        reason: &'static str,
    },
    /// Epoch floor, convergence streak, and epoch cap must be consistent.
    InvalidEpochs {
        epochs_min: usize,
        nr_conv_min: usize,
        max_epochs: usize,
        reason: &'static str,
    },
    /// Adam step size needs to be positive and finite.
    InvalidLearningRate {
        lr: f64,
        reason: &'static str,
    },
    /// Adam moment decay rates need to lie in [0, 1).
    InvalidMomentDecay {
        beta: f64,
        reason: &'static str,
    },
    /// Adam denominator offset needs to be positive and finite.
    InvalidEpsilon {
        eps: f64,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Structural estimation ----
    /// Parameter vector does not match the network's parameter layout.
    ParamLengthMismatch {
        expected: usize,
        found: usize,
    },
    /// A structurally-zero coefficient acquired mass during estimation.
    SupportLeak {
        epoch: u64,
        index: usize,
        value: f64,
    },
    /// The epoch cap was hit before the convergence rule was satisfied.
    MaxEpochsReached {
        epochs: u64,
        sse: f64,
    },
    /// Tikhonov weight must be finite and non-negative.
    InvalidTikhonov {
        alpha: f64,
    },
    /// Failure inside the effects algebra during a forward pass.
    Effects(EffectsError),

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Error raised by argmin itself; `kind` names the `ArgminError` variant.
    Solver {
        kind: &'static str,
        text: String,
    },
    /// Any other error carried through argmin, e.g. a model failure inside
    /// an objective or an observer error.
    BackendError {
        text: String,
    },

    // ---- Finite Diffs ----
    /// Hessian matrix dimensions do not match parameter dimensions.
    HessianDimMismatch {
        expected: usize,
        found: (usize, usize),
    },

    /// Hessian values need to be finite.
    InvalidHessian {
        row: usize,
        col: usize,
        value: f64,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MinimizerOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidMethod { name, reason } => {
                write!(f, "Invalid minimizer method '{name}': {reason}")
            }

            // ---- EstimatorOptions ----
            OptError::InvalidRelTol { tol, reason } => {
                write!(f, "Invalid relative SSE tolerance {tol}: {reason}")
            }
            OptError::InvalidEpochs { epochs_min, nr_conv_min, max_epochs, reason } => {
                write!(
                    f,
                    "Invalid epoch settings (epochs_min {epochs_min}, nr_conv_min {nr_conv_min}, max_epochs {max_epochs}): {reason}"
                )
            }
            OptError::InvalidLearningRate { lr, reason } => {
                write!(f, "Invalid learning rate {lr}: {reason}")
            }
            OptError::InvalidMomentDecay { beta, reason } => {
                write!(f, "Invalid moment decay rate {beta}: {reason}")
            }
            OptError::InvalidEpsilon { eps, reason } => {
                write!(f, "Invalid epsilon {eps}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Structural estimation ----
            OptError::ParamLengthMismatch { expected, found } => {
                write!(f, "Parameter length mismatch: expected {expected}, found {found}")
            }
            OptError::SupportLeak { epoch, index, value } => {
                write!(
                    f,
                    "Identification restriction violated at epoch {epoch}: parameter {index} is {value} outside the identified support"
                )
            }
            OptError::MaxEpochsReached { epochs, sse } => {
                write!(f, "Estimation did not converge within {epochs} epochs (last sse {sse})")
            }
            OptError::InvalidTikhonov { alpha } => {
                write!(f, "Invalid Tikhonov weight {alpha}: must be finite and non-negative")
            }
            OptError::Effects(err) => write!(f, "Effects error: {err}"),

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::Solver { kind, text } => write!(f, "Solver error ({kind}): {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        // Crate errors travel through argmin boxed in `anyhow::Error`.
        let err = match err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                let kind = match &argmin_err {
                    ArgminError::InvalidParameter { .. } => "invalid parameter",
                    ArgminError::NotImplemented { .. } => "not implemented",
                    ArgminError::NotInitialized { .. } => "not initialized",
                    ArgminError::ConditionViolated { .. } => "condition violated",
                    ArgminError::CheckpointNotFound { .. } => "checkpoint not found",
                    ArgminError::PotentialBug { .. } => "potential bug",
                    ArgminError::ImpossibleError { .. } => "impossible error",
                    _ => "unknown",
                };
                OptError::Solver { kind, text: argmin_err.to_string() }
            }
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<EffectsError> for OptError {
    fn from(err: EffectsError) -> Self {
        OptError::Effects(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for pyo3::PyErr {
    fn from(err: OptError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

//! Consistency checks shared by the minimizer entry points, the argmin
//! adapter, and the finite-difference helpers.
//!
//! Every check returns the first offending entry so error messages can
//! point at a coordinate of `theta`, the gradient, or the Hessian.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{Grad, Theta, types::Hessian},
};

/// Optional tolerance must be finite and strictly positive.
fn verify_tolerance(
    tol: Option<f64>, to_err: fn(f64, &'static str) -> OptError,
) -> OptResult<()> {
    match tol {
        Some(t) if !t.is_finite() => Err(to_err(t, "Tolerance must be finite.")),
        Some(t) if t <= 0.0 => Err(to_err(t, "Tolerance must be positive.")),
        _ => Ok(()),
    }
}

/// # Errors
/// [`OptError::InvalidTolGrad`] for a non-finite or non-positive value.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    verify_tolerance(tol, |tol, reason| OptError::InvalidTolGrad { tol, reason })
}

/// # Errors
/// [`OptError::InvalidTolCost`] for a non-finite or non-positive value.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    verify_tolerance(tol, |tol, reason| OptError::InvalidTolCost { tol, reason })
}

/// Gradient of length `dim` with finite entries.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] on a length mismatch.
/// - [`OptError::InvalidGradient`] at the first non-finite entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match first_non_finite(grad.iter()) {
        Some((index, value)) => Err(OptError::InvalidGradient {
            index,
            value,
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best parameter, which must exist and be finite.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if the solver kept no parameter.
/// - [`OptError::InvalidThetaHat`] at the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, value)) = first_non_finite(theta.iter()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(theta)
}

/// # Errors
/// [`OptError::NonFiniteCost`] for `NaN` or `±∞`.
pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_finite() { Ok(()) } else { Err(OptError::NonFiniteCost { value }) }
}

/// Square `dim × dim` Hessian with finite entries.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] on a shape mismatch.
/// - [`OptError::InvalidHessian`] at the first non-finite entry.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.dim() != (dim, dim) {
        return Err(OptError::HessianDimMismatch { expected: dim, found: hessian.dim() });
    }
    match hessian.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), &value)) => Err(OptError::InvalidHessian { row, col, value }),
        None => Ok(()),
    }
}

fn first_non_finite<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(usize, f64)> {
    values.copied().enumerate().find(|(_, v)| !v.is_finite())
}

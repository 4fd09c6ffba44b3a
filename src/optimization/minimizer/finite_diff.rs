//! minimizer::finite_diff — finite-difference gradient, Jacobian, and Hessian helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference derivative approximations around a parameter
//! vector, together with validation and symmetry cleanup, so that the rest
//! of the crate can request derivatives without depending directly on the
//! `finitediff` API.
//!
//! Key behaviors
//! -------------
//! - Compute forward-difference gradients with error capture and
//!   post-hoc validation via [`run_fd_diff`].
//! - Build row-by-row central-difference Jacobians of fallible vector
//!   functions via [`compute_jacobian`].
//! - Construct central-difference Hessians, falling back to forward
//!   differences when validation fails, via [`compute_hessian`].
//! - Enforce symmetry of Hessian matrices in-place using
//!   [`symmetrize_hess`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Any error raised by the differentiated function is routed into a
//!   shared `closure_err` cell and treated as a hard failure.
//! - Gradients and Hessians returned from this module satisfy
//!   [`validate_grad`] and [`validate_hessian`].
//!
//! Conventions
//! -----------
//! - Jacobians are `out_dim × theta.len()`: one row per output component.
//! - Central differences are preferred; forward differences are used only
//!   as a fallback for Hessians that fail validation.
//!
//! Downstream usage
//! ----------------
//! - [`adapter::ArgMinAdapter`](super::adapter::ArgMinAdapter) falls back to
//!   [`run_fd_diff`] when an objective has no analytic gradient.
//! - `inference::delta` cross-checks the algebraic effects Jacobian against
//!   [`compute_jacobian`].
//! - The structural estimator and the bias estimator call
//!   [`compute_hessian`] on gradient closures.
//!
//! Testing notes
//! -------------
//! - Unit tests cover successful and failing paths for gradients,
//!   Jacobians, and Hessians, including closure-error propagation.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use ndarray::Array2;
use std::cell::RefCell;

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Parameters
/// ----------
/// - `theta`: `&Theta`
///   Point at which the gradient is approximated.
/// - `func`: `&G`
///   Scalar objective. Expected to store any evaluation error in
///   `closure_err` and return `NaN`.
/// - `closure_err`: `&RefCell<Option<Error>>`
///   Shared error slot; cleared on entry and inspected afterwards.
///
/// Returns
/// -------
/// `OptResult<Grad>`
///   The validated forward-difference gradient.
///
/// Errors
/// ------
/// - Any error captured in `closure_err`, converted via `From<Error>`.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

/// compute_jacobian — central-difference Jacobian of a fallible vector map.
///
/// Purpose
/// -------
/// Approximate `∂f(θ)/∂θ` for `f: ℝⁿ → ℝᵏ` by differentiating each output
/// component with a central scheme. The first error raised by `f` aborts
/// the computation.
///
/// Parameters
/// ----------
/// - `f`: `&F`
///   Vector function returning `OptResult<Theta>` of fixed length.
/// - `theta`: `&Theta`
///   Point of differentiation.
///
/// Returns
/// -------
/// `OptResult<Array2<f64>>`
///   A `k × n` matrix whose row `i` is the gradient of output `i`.
///
/// Errors
/// ------
/// - Any error returned by `f`, including at the base point.
/// - `OptError::GradientDimMismatch` if `f` changes its output length
///   between evaluations.
/// - `OptError::InvalidGradient` if a row contains non-finite entries.
///
/// Notes
/// -----
/// - Each row costs `2n` evaluations of `f`; intended for the moderate
///   dimensions of effect vectors.
pub fn compute_jacobian<F>(f: &F, theta: &Theta) -> OptResult<Array2<f64>>
where
    F: Fn(&Theta) -> OptResult<Theta>,
{
    let out_dim = f(theta)?.len();
    let dim = theta.len();
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let mut jac = Array2::<f64>::zeros((out_dim, dim));
    for row in 0..out_dim {
        let component = |x: &Theta| -> f64 {
            match f(x) {
                Ok(values) if values.len() == out_dim => values[row],
                Ok(values) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(OptError::GradientDimMismatch {
                            expected: out_dim,
                            found: values.len(),
                        });
                    }
                    f64::NAN
                }
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let grad_row = theta.central_diff(&component);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        validate_grad(&grad_row, dim)?;
        jac.row_mut(row).assign(&grad_row);
    }
    Ok(jac)
}

/// compute_hessian — finite-difference Hessian with validation and symmetry.
///
/// Purpose
/// -------
/// Approximate the Hessian from a gradient function at `theta`, preferring a
/// central-difference scheme and falling back to a forward-difference scheme
/// when validation fails. The result is symmetrized before being returned.
///
/// Parameters
/// ----------
/// - `f`: `&F`
///   Gradient function mapping `theta` to a gradient vector.
/// - `theta`: `&Theta`
///   Point of differentiation; defines the `dim × dim` output shape.
///
/// Returns
/// -------
/// `OptResult<Hessian>`
///   A finite, symmetric `dim × dim` matrix.
///
/// Errors
/// ------
/// - `OptError::HessianDimMismatch` / `OptError::InvalidHessian` when the
///   forward-difference fallback also fails validation.
///
/// Notes
/// -----
/// - Only the forward-difference validation result is surfaced; the central
///   attempt's error is discarded.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut cent_hess = theta.central_hessian(f);
    match validate_hessian(&cent_hess, dim) {
        Ok(_) => {
            symmetrize_hess(&mut cent_hess);
            Ok(cent_hess)
        }
        Err(_) => {
            let mut forward_hess = theta.forward_hessian(f);
            validate_hessian(&forward_hess, dim)?;
            symmetrize_hess(&mut forward_hess);
            Ok(forward_hess)
        }
    }
}

// ---- Helper methods ----

/// Replace each off-diagonal pair with its average; the diagonal is untouched.
///
/// Assumes `hess` is square.
pub fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

//! High-level entry point for minimizing a user-provided `Objective`.
//!
//! This selects BFGS (More–Thuente line search) or Nelder–Mead, wraps the
//! objective in an `ArgMinAdapter`, and delegates the run to the matching
//! runner. [`numerical_hessian`] provides curvature for methods that do not
//! report any.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        Grad, MinimizeOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_bfgs, build_nelder_mead},
        finite_diff::compute_hessian,
        run::{cost_at, run_bfgs, run_nelder_mead},
        traits::{Method, MinimizerOptions, Objective},
        types::Hessian,
    },
};
use argmin::core::Gradient;
use std::cell::RefCell;

/// Minimize a cost `c(θ)` with the configured method.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Logs `c(θ₀)` at debug level.
/// - Builds the solver selected by `opts.method` and runs it.
///
/// # Errors
/// - Propagates any error from `f.check` or from evaluating `c(θ₀)`.
/// - Propagates builder errors and runtime errors (e.g., line-search
///   failures or user errors raised during evaluation).
///
/// # Returns
/// A [`MinimizeOutcome`] containing `theta_hat`, the best cost, termination
/// status, iteration and evaluation counts, the last gradient norm, and the
/// inverse-Hessian estimate when the method maintains one.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_causal::optimization::errors::OptResult;
/// use rust_causal::optimization::minimizer::{minimize, MinimizerOptions, Objective, Theta};
///
/// struct Bowl;
/// impl Objective for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.1, -0.2], &(), &MinimizerOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), rust_causal::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MinimizerOptions,
) -> OptResult<MinimizeOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    log::debug!("minimize: method {:?}, cost(theta0) = {}", opts.method, cost_at(&problem, &theta0)?);
    match opts.method {
        Method::Bfgs => {
            let solver = build_bfgs(opts)?;
            run_bfgs(theta0, opts, problem, solver)
        }
        Method::NelderMead => {
            let solver = build_nelder_mead(&theta0, opts)?;
            run_nelder_mead(opts, problem, solver)
        }
    }
}

/// Finite-difference Hessian of `f` at `theta`.
///
/// Differentiates the adapter gradient (analytic if `f` provides one,
/// central differences of the cost otherwise) and symmetrizes the result.
///
/// # Errors
/// - The first error raised while evaluating the gradient.
/// - `OptError::HessianDimMismatch` / `OptError::InvalidHessian` from
///   validation.
pub fn numerical_hessian<F: Objective>(
    f: &F, theta: &Theta, data: &F::Data,
) -> OptResult<Hessian> {
    let problem = ArgMinAdapter::new(f, data);
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let grad = |t: &Theta| -> Grad {
        match problem.gradient(t) {
            Ok(g) => g,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e.into());
                }
                Grad::from_elem(t.len(), f64::NAN)
            }
        }
    };
    let hessian = compute_hessian(&grad, theta);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    hessian
}

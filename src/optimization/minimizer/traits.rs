//! Public API surface for general-purpose minimization.
//!
//! - [`Objective`]: trait users implement for the scalar function to minimize.
//! - [`MinimizerOptions`] and [`Tolerances`]: configuration for the minimizer.
//! - [`Method`]: choice between quasi-Newton BFGS and derivative-free
//!   Nelder–Mead.
//! - [`MinimizeOutcome`]: normalized result returned by `minimize`.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        Cost, FnEvalMap, Grad, Theta,
        types::Hessian,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented objective interface.
///
/// - `type Data`: per-problem data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate the cost `c(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before minimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇c(θ)`.
///   If not implemented, robust finite differences are used automatically.
pub trait Objective {
    type Data;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of minimization method.
///
/// Variants:
/// - `Bfgs`: quasi-Newton BFGS with More–Thuente line search. Carries an
///   inverse-Hessian estimate that is reported in the outcome.
/// - `NelderMead`: derivative-free simplex search. Reports no curvature.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"BFGS"`, `"NelderMead"`, `"Nelder-Mead"`). Unknown names return
/// `OptError::InvalidMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Bfgs,
    NelderMead,
}

impl FromStr for Method {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bfgs" => Ok(Method::Bfgs),
            "neldermead" | "nelder-mead" => Ok(Method::NelderMead),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'BFGS' or 'NelderMead'.",
            }),
        }
    }
}

/// Minimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances`: numerical tolerances and iteration limits.
/// - `method: Method`: BFGS (default) or Nelder–Mead.
/// - `verbose: bool`: if `true`, attaches an observer (behind the `obs_slog`
///   feature) and logs the initial state.
///
/// Default:
/// - `tols`: `tol_grad = 1e-8`, `tol_cost = None`, `max_iter = 200`
/// - `method`: `Bfgs`
/// - `verbose`: `false`
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerOptions {
    pub tols: Tolerances,
    pub method: Method,
    pub verbose: bool,
}

impl MinimizerOptions {
    /// Create a new set of minimizer options.
    ///
    /// Validation of numeric values is performed inside [`Tolerances::new`].
    pub fn new(tols: Tolerances, method: Method, verbose: bool) -> Self {
        Self { tols, method, verbose }
    }
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-8), tol_cost: None, max_iter: Some(200) },
            method: Method::Bfgs,
            verbose: false,
        }
    }
}

/// Numerical tolerances and iteration limits used by the minimizer.
///
/// - `tol_grad`: BFGS terminates when the gradient norm falls below this.
/// - `tol_cost`: BFGS terminates when the cost change falls below this;
///   Nelder–Mead uses it as the simplex standard-deviation tolerance.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best cost `c(θ̂)`.
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the last available gradient, if present.
/// - `inv_hessian`: the solver's final inverse-Hessian estimate (BFGS only).
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub inv_hessian: Option<Hessian>,
}

impl MinimizeOutcome {
    /// Build a validated [`MinimizeOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>, inv_hessian: Option<Hessian>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
            inv_hessian,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `Method` parsing.
    // - `Tolerances` validation rules.
    // - Outcome validation of non-finite estimates.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify case-insensitive method parsing and rejection of unknown names.
    //
    // Given
    // -----
    // - Strings "bfgs", "Nelder-Mead", and "Powell".
    //
    // Expect
    // ------
    // - `Bfgs`, `NelderMead`, and `OptError::InvalidMethod` respectively.
    fn method_from_str_accepts_known_names() {
        assert_eq!("bfgs".parse::<Method>().expect("known"), Method::Bfgs);
        assert_eq!("Nelder-Mead".parse::<Method>().expect("known"), Method::NelderMead);
        assert!(matches!("Powell".parse::<Method>(), Err(OptError::InvalidMethod { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Ensure `Tolerances::new` enforces its rules.
    //
    // Given
    // -----
    // - All-`None`, negative gradient tolerance, and zero iterations.
    //
    // Expect
    // ------
    // - The matching `OptError` variant for each case.
    fn tolerances_new_validates_inputs() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(Tolerances::new(None, None, Some(0)), Err(OptError::InvalidMaxIter { .. })));
        assert!(Tolerances::new(None, Some(1e-9), None).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Check that a non-finite estimate cannot become an outcome.
    //
    // Given
    // -----
    // - `theta_hat = [NaN]`.
    //
    // Expect
    // ------
    // - `OptError::InvalidThetaHat { index: 0, .. }`.
    fn outcome_rejects_non_finite_theta() {
        let err = MinimizeOutcome::new(
            Some(Theta::from(vec![f64::NAN])),
            0.0,
            TerminationStatus::NotTerminated,
            1,
            FnEvalMap::new(),
            None,
            None,
        )
        .expect_err("NaN estimate");
        assert!(matches!(err, OptError::InvalidThetaHat { index: 0, .. }));
    }
}

//! Adapter that exposes a user `Objective` as an `argmin` problem.
//!
//! The objective is already a cost, so values and analytic gradients pass
//! through unchanged. If a gradient is not provided, the cost closure is
//! finite-differenced.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    minimizer::{
        finite_diff::run_fd_diff,
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `Objective` to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the user's `value`.
    /// - `OptError::NonFiniteCost` if the value is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// Behavior:
    /// - If the user implements `grad(θ, data)`, it is validated and returned.
    /// - Otherwise a central-difference gradient of the cost is computed;
    ///   if a cost evaluation failed or the result is not finite, the
    ///   computation is retried once with forward differences.
    ///
    /// # Errors
    /// - Propagates user errors from `grad` (other than
    ///   `GradientNotImplemented`).
    /// - Propagates errors raised by cost evaluations during FD.
    /// - Returns validation errors for wrong dimensions or non-finite entries.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
                    return Ok(fd_grad);
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `Objective` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Pass-through of costs and analytic gradients.
    // - Finite-difference fallback when no gradient is implemented.
    // - Rejection of non-finite costs.
    // -------------------------------------------------------------------------

    struct Shifted;

    impl Objective for Shifted {
        type Data = f64;

        fn value(&self, theta: &Theta, shift: &f64) -> OptResult<Cost> {
            Ok(theta.mapv(|t| (t - shift).powi(2)).sum())
        }

        fn check(&self, _theta: &Theta, _shift: &f64) -> OptResult<()> {
            Ok(())
        }
    }

    struct Analytic;

    impl Objective for Analytic {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            Ok(theta.dot(theta))
        }

        fn check(&self, _theta: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(theta.mapv(|t| 2.0 * t))
        }
    }

    #[test]
    // Purpose
    // -------
    // Confirm the cost is passed through without a sign flip.
    //
    // Given
    // -----
    // - `c(θ) = Σ(θ − 1)²` at `θ = [3]`.
    //
    // Expect
    // ------
    // - Cost `4`.
    fn cost_is_passed_through() {
        let adapter = ArgMinAdapter::new(&Shifted, &1.0);

        let cost = adapter.cost(&array![3.0]).expect("finite cost");

        assert_eq!(cost, 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify the finite-difference fallback approximates the true gradient.
    //
    // Given
    // -----
    // - `c(θ) = Σ(θ − 1)²` at `θ = [3, 0]`.
    //
    // Expect
    // ------
    // - Gradient close to `[4, −2]`.
    fn gradient_falls_back_to_finite_differences() {
        let adapter = ArgMinAdapter::new(&Shifted, &1.0);

        let grad = adapter.gradient(&array![3.0, 0.0]).expect("fd gradient");

        assert!((grad[0] - 4.0).abs() < 1e-5);
        assert!((grad[1] + 2.0).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Ensure analytic gradients are used as-is.
    //
    // Given
    // -----
    // - `c(θ) = θᵀθ` with analytic gradient `2θ`.
    //
    // Expect
    // ------
    // - Exactly `[2, −4]` at `θ = [1, −2]`.
    fn analytic_gradient_is_used() {
        let adapter = ArgMinAdapter::new(&Analytic, &());

        let grad = adapter.gradient(&array![1.0, -2.0]).expect("analytic gradient");

        assert_eq!(grad, array![2.0, -4.0]);
    }

    #[test]
    // Purpose
    // -------
    // Check non-finite costs are reported as `NonFiniteCost`.
    //
    // Given
    // -----
    // - A shift of `+∞`.
    //
    // Expect
    // ------
    // - `OptError::NonFiniteCost` after conversion.
    fn non_finite_cost_is_rejected() {
        let adapter = ArgMinAdapter::new(&Shifted, &f64::INFINITY);

        let err = adapter.cost(&array![0.0]).expect_err("infinite cost");

        assert!(matches!(OptError::from(err), OptError::NonFiniteCost { .. }));
    }
}

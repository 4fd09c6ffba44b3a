//! model::bias — additive bias of a single equation.
//!
//! Purpose
//! -------
//! Test whether one equation is systematically shifted: hold every
//! coefficient at its theoretical value, add a scalar `bias` to equation
//! `bias_ind` (propagating through downstream equations), and minimize the
//! weighted SSE of the manifest predictions against the raw observations.
//!
//! Key behaviors
//! -------------
//! - [`sse_bias`]: `tr(errᵀ·selwei·err)` with `err = fym·yhat(bias) − ymdat`;
//!   no Tikhonov term.
//! - [`optimize_bias`]: minimization from `bias = 0` with the configured
//!   method, plus the scalar Hessian at the optimum.
//! - [`estimate_biases`]: one [`BiasEstimate`] per equation.
//!
//! Conventions
//! -----------
//! - The Hessian is the inverse of the optimizer's inverse-Hessian estimate
//!   when the method maintains one ([`HessianSource::Optimizer`]) and a
//!   finite-difference second derivative otherwise
//!   ([`HessianSource::Numerical`]).
use crate::{
    model::{
        adjacency::Adjacency,
        data::ObservedData,
        equations::DifferentiableModel,
        errors::{ModelError, ModelResult},
        spec::ModelSpec,
    },
    optimization::{
        errors::{OptError, OptResult},
        minimizer::{Cost, MinimizerOptions, Objective, Theta, minimize, numerical_hessian},
    },
};
use ndarray::{Array2, array};

/// Origin of a scalar bias Hessian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HessianSource {
    Optimizer,
    Numerical,
}

/// Estimated bias of one equation.
///
/// - `bias_ind`, `variable`: equation index and its endogenous variable.
/// - `bias`: minimizing shift.
/// - `hessian`: second derivative of the SSE at `bias`.
/// - `sse`: SSE at `bias`.
/// - `converged`: termination flag reported by the minimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasEstimate {
    pub bias_ind: usize,
    pub variable: String,
    pub bias: f64,
    pub hessian: f64,
    pub sse: f64,
    pub hessian_source: HessianSource,
    pub converged: bool,
}

/// Weighted SSE of the model with `bias` added to equation `bias_ind`.
///
/// # Errors
/// Propagates [`Adjacency::model`] errors.
pub fn sse_bias<M: DifferentiableModel>(
    adjacency: &Adjacency<M>, data: &ObservedData, fym: &Array2<f64>, bias: f64, bias_ind: usize,
) -> ModelResult<f64> {
    let yhat = adjacency.model(&data.xdat, bias, bias_ind)?;
    let err = fym.dot(&yhat) - &data.ymdat;
    let sse = (data.selwei.dot(&err) * &err).sum();
    log::debug!("sse {sse:10.6}, bias {bias:10.6}");
    Ok(sse)
}

/// Bias objective over a one-element parameter.
struct BiasObjective<'a, M: DifferentiableModel> {
    adjacency: &'a Adjacency<M>,
    fym: Array2<f64>,
    bias_ind: usize,
}

impl<'a, M: DifferentiableModel> Objective for BiasObjective<'a, M> {
    type Data = ObservedData;

    fn value(&self, theta: &Theta, data: &ObservedData) -> OptResult<Cost> {
        sse_bias(self.adjacency, data, &self.fym, theta[0], self.bias_ind)
            .map_err(|err| OptError::BackendError { text: err.to_string() })
    }

    fn check(&self, theta: &Theta, _data: &ObservedData) -> OptResult<()> {
        if theta.len() != 1 {
            return Err(OptError::ParamLengthMismatch { expected: 1, found: theta.len() });
        }
        Ok(())
    }
}

/// optimize_bias — estimate the additive bias of equation `bias_ind`.
///
/// Parameters
/// ----------
/// - `spec`, `adjacency`, `data`: model, equations, and observations.
/// - `bias_ind`: index of the shifted equation in `yvars`.
/// - `opts`: minimizer settings; `Method::Bfgs` reports curvature,
///   `Method::NelderMead` does not.
///
/// Returns
/// -------
/// `ModelResult<BiasEstimate>`.
///
/// Errors
/// ------
/// - `ModelError::InvalidBiasIndex` if `bias_ind >= n`.
/// - `ModelError::Optimization` for minimizer and Hessian failures.
pub fn optimize_bias<M: DifferentiableModel>(
    spec: &ModelSpec, adjacency: &Adjacency<M>, data: &ObservedData, bias_ind: usize,
    opts: &MinimizerOptions,
) -> ModelResult<BiasEstimate> {
    let variable = spec
        .yvars
        .get(bias_ind)
        .ok_or(ModelError::InvalidBiasIndex { index: bias_ind, ndim: spec.ndim() })?
        .clone();
    log::info!("estimation of bias for {variable}");
    let objective = BiasObjective { adjacency, fym: spec.fym(), bias_ind };
    let out = minimize(&objective, array![0.0], data, opts)?;
    let bias = out.theta_hat[0];

    let from_optimizer = out
        .inv_hessian
        .as_ref()
        .map(|inv_h| inv_h[[0, 0]])
        .filter(|v| v.is_finite() && *v > 0.0);
    let (hessian, hessian_source) = match from_optimizer {
        Some(inv_h) => {
            log::info!("scalar Hessian from method {:?}", opts.method);
            (1.0 / inv_h, HessianSource::Optimizer)
        }
        None => {
            log::info!("scalar Hessian numerically");
            let hess = numerical_hessian(&objective, &out.theta_hat, data)?;
            (hess[[0, 0]], HessianSource::Numerical)
        }
    };

    Ok(BiasEstimate {
        bias_ind,
        variable,
        bias,
        hessian,
        sse: out.value,
        hessian_source,
        converged: out.converged,
    })
}

/// Bias estimates for every equation, in `yvars` order.
///
/// # Errors
/// The first [`optimize_bias`] failure.
pub fn estimate_biases<M: DifferentiableModel>(
    spec: &ModelSpec, adjacency: &Adjacency<M>, data: &ObservedData, opts: &MinimizerOptions,
) -> ModelResult<Vec<BiasEstimate>> {
    (0..spec.ndim()).map(|i| optimize_bias(spec, adjacency, data, i, opts)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use crate::{
        model::equations::LinearEquations,
        optimization::minimizer::{Method, Tolerances},
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of an injected shift with BFGS and Nelder–Mead.
    // - The Hessian source reported by each method.
    // - Propagation of a bias to downstream manifest variables.
    // - Rejection of an out-of-range equation index.
    // -------------------------------------------------------------------------

    const SHIFT: f64 = 0.7;

    /// `y1 = 0.5·x`, `y2 = 2·y1`; data generated with `SHIFT` on `y1` and
    /// a small deterministic wiggle so both variances are positive.
    fn shifted_model() -> (ModelSpec, Adjacency<LinearEquations>, ObservedData) {
        let spec = ModelSpec::new(&["x"], &["y1", "y2"], &["y1", "y2"], "y2").expect("spec");
        let eqs = LinearEquations::new(ndarray::array![[0.5], [0.0]], ndarray::array![[0.0, 0.0], [2.0, 0.0]])
            .expect("equations");
        let adjacency = Adjacency::new(eqs).expect("acyclic");
        let x: Vec<f64> = (0..12).map(|t| t as f64 / 3.0 - 2.0).collect();
        let wiggle = |t: usize| if t % 2 == 0 { 0.01 } else { -0.01 };
        let y1: Vec<f64> = x.iter().enumerate().map(|(t, v)| 0.5 * v + SHIFT + wiggle(t)).collect();
        let y2: Vec<f64> = y1.iter().enumerate().map(|(t, v)| 2.0 * v - wiggle(t)).collect();
        let xdat = Array2::from_shape_vec((1, 12), x).expect("shape");
        let ymdat = Array2::from_shape_vec((2, 12), [y1, y2].concat()).expect("shape");
        let data = ObservedData::new(xdat, ymdat, &spec).expect("data");
        (spec, adjacency, data)
    }

    #[test]
    // Purpose
    // -------
    // Verify BFGS recovers the injected shift and reports its curvature.
    //
    // Given
    // -----
    // - Data shifted by `0.7` on `y1` (and hence `1.4` on `y2`).
    //
    // Expect
    // ------
    // - `bias ≈ 0.7` to 1e-3, positive Hessian from the optimizer.
    fn bfgs_recovers_shift() {
        let (spec, adjacency, data) = shifted_model();

        let est = optimize_bias(&spec, &adjacency, &data, 0, &MinimizerOptions::default())
            .expect("bias estimate");

        assert_abs_diff_eq!(est.bias, SHIFT, epsilon = 1e-3);
        assert_eq!(est.variable, "y1");
        assert_eq!(est.hessian_source, HessianSource::Optimizer);
        assert!(est.hessian > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify Nelder–Mead recovers the shift with a numerical Hessian.
    //
    // Given
    // -----
    // - The same data, Nelder–Mead with `tol_cost = 1e-10`.
    //
    // Expect
    // ------
    // - `bias ≈ 0.7` to 1e-3; Hessian matches `2·Σ_t Σ_i w_i·(∂yhat_i/∂bias)²`
    //   with derivatives `(1, 2)` to 1e-3 relative.
    fn nelder_mead_uses_numerical_hessian() {
        let (spec, adjacency, data) = shifted_model();
        let tols = Tolerances::new(None, Some(1e-10), Some(500)).expect("tolerances");
        let opts = MinimizerOptions::new(tols, Method::NelderMead, false);

        let est = optimize_bias(&spec, &adjacency, &data, 0, &opts).expect("bias estimate");

        let expected = 2.0 * 12.0 * (data.selwei[[0, 0]] + 4.0 * data.selwei[[1, 1]]);
        assert_abs_diff_eq!(est.bias, SHIFT, epsilon = 1e-3);
        assert_eq!(est.hessian_source, HessianSource::Numerical);
        assert_relative_eq!(est.hessian, expected, max_relative = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // Check the SSE reacts to a bias on an upstream equation.
    //
    // Given
    // -----
    // - SSE at `bias = 0` and at `bias = SHIFT` on equation 0.
    //
    // Expect
    // ------
    // - The shifted SSE is much smaller.
    fn sse_bias_prefers_true_shift() {
        let (spec, adjacency, data) = shifted_model();
        let fym = spec.fym();

        let at_zero = sse_bias(&adjacency, &data, &fym, 0.0, 0).expect("sse");
        let at_shift = sse_bias(&adjacency, &data, &fym, SHIFT, 0).expect("sse");

        assert!(at_shift < 0.01 * at_zero);
    }

    #[test]
    // Purpose
    // -------
    // Ensure every equation gets an estimate and bad indices are rejected.
    //
    // Given
    // -----
    // - `estimate_biases` on the shifted model; `bias_ind = 5`.
    //
    // Expect
    // ------
    // - Two estimates in `yvars` order; `InvalidBiasIndex { index: 5, ndim: 2 }`.
    fn estimate_biases_covers_all_equations() {
        let (spec, adjacency, data) = shifted_model();
        let opts = MinimizerOptions::default();

        let all = estimate_biases(&spec, &adjacency, &data, &opts).expect("estimates");
        let err = optimize_bias(&spec, &adjacency, &data, 5, &opts).expect_err("bad index");

        assert_eq!(all.iter().map(|b| b.bias_ind).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(err, ModelError::InvalidBiasIndex { index: 5, ndim: 2 });
    }
}

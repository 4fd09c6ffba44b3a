//! Execution helpers that run an `argmin` solver on an objective and return a
//! crate-friendly [`MinimizeOutcome`].
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        Grad, MinimizeOutcome, MinimizerOptions, Objective, Theta, adapter::ArgMinAdapter,
        types::Hessian,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::Gradient;
use argmin::core::{CostFunction, Executor, IterState, Solver, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;
use ndarray::Array2;

/// Run a quasi-Newton solver whose state carries an inverse Hessian.
///
/// Wires up:
/// - the objective via [`ArgMinAdapter`],
/// - the initial parameter `theta0` and an identity inverse Hessian,
/// - optional observers (behind the `obs_slog` feature),
/// - optional `max_iters`,
///
/// then executes the solver and converts the final state into a
/// [`MinimizeOutcome`] that includes the solver's inverse-Hessian estimate.
///
/// # Errors
/// - Propagates any `argmin` runtime error (line-search failures, observer
///   failures, user errors raised inside the cost) via `From<Error>`.
/// - Propagates validation errors from [`MinimizeOutcome::new`].
///
/// # Examples
/// ```ignore
/// let problem = ArgMinAdapter::new(&objective, &data);
/// let solver = build_bfgs(&opts)?;
/// let out = run_bfgs(theta0, &opts, problem, solver)?;
/// ```
pub fn run_bfgs<'a, F, S>(
    theta0: Theta, opts: &MinimizerOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<MinimizeOutcome>
where
    F: Objective,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), Hessian, (), f64>>,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let dim = theta0.len();
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0).inv_hessian(Array2::eye(dim)));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let inv_hessian = result.take_inv_hessian();
    log::debug!("bfgs finished after {iterations} iterations: {termination:?}");
    MinimizeOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
        inv_hessian,
    )
}

/// Run a derivative-free simplex solver.
///
/// The starting point is encoded in the solver's simplex, so only the
/// iteration limit and observers are configured here. The outcome carries
/// no gradient and no curvature.
///
/// # Errors
/// - Propagates any `argmin` runtime error via `From<Error>`.
/// - Propagates validation errors from [`MinimizeOutcome::new`].
pub fn run_nelder_mead<'a, F, S>(
    opts: &MinimizerOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<MinimizeOutcome>
where
    F: Objective,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, (), (), (), (), f64>>,
{
    let mut optimizer = Executor::new(problem, solver);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    log::debug!("nelder-mead finished after {iterations} iterations: {termination:?}");
    MinimizeOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        None,
        None,
    )
}

/// Evaluate the cost of `theta` through the adapter.
///
/// Used by callers that need `c(θ₀)` for logging before a run.
pub(crate) fn cost_at<F: Objective>(problem: &ArgMinAdapter<'_, F>, theta: &Theta) -> OptResult<f64> {
    Ok(problem.cost(theta)?)
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: Objective,
{
    let c0 = cost_at(problem, theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: cost(theta0) = {:.6}{}",
        c0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}

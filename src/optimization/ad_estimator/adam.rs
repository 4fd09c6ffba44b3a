//! ad_estimator::adam — Adam as an argmin solver with an epoch-based stop rule.
//!
//! Each argmin iteration is one epoch: one gradient evaluation at the current
//! iterate, one Adam step, one cost evaluation at the new iterate. The solver
//! counts consecutive epochs whose relative cost change is below `rel` and
//! terminates once at least `epochs_min` epochs ran and the streak reached
//! `nr_conv_min`. The epoch cap is left to argmin's `max_iters`.
use crate::optimization::{
    ad_estimator::options::EstimatorOptions,
    minimizer::{Grad, Theta},
};
use argmin::core::{
    ArgminError, CostFunction, Error, Gradient, IterState, KV, Problem, Solver, State,
    TerminationReason, TerminationStatus,
};

/// Adam optimizer state plus the convergence streak bookkeeping.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    rel: f64,
    epochs_min: u64,
    nr_conv_min: usize,
    moment1: Option<Grad>,
    moment2: Option<Grad>,
    nr_conv: usize,
}

impl Adam {
    pub fn new(opts: &EstimatorOptions) -> Self {
        Self {
            learning_rate: opts.learning_rate,
            beta1: opts.beta1,
            beta2: opts.beta2,
            eps: opts.eps,
            rel: opts.rel,
            epochs_min: opts.epochs_min as u64,
            nr_conv_min: opts.nr_conv_min,
            moment1: None,
            moment2: None,
            nr_conv: 0,
        }
    }

    /// Current number of consecutive converged epochs.
    pub fn nr_conv(&self) -> usize {
        self.nr_conv
    }

    /// Update the streak with the cost before and after an epoch.
    ///
    /// A zero previous cost counts as converged only if the new cost is
    /// zero as well.
    fn record_epoch(&mut self, sse_old: f64, sse: f64) -> f64 {
        let change = if sse_old == 0.0 {
            if sse == 0.0 { 0.0 } else { f64::INFINITY }
        } else {
            (sse - sse_old).abs() / sse_old.abs()
        };
        if change < self.rel {
            self.nr_conv += 1;
        } else {
            self.nr_conv = 0;
        }
        change
    }

    /// One bias-corrected Adam step at iteration `t` (1-based).
    fn step(&mut self, param: &Theta, grad: &Grad, t: i32) -> Theta {
        let m = match self.moment1.take() {
            Some(m) => m * self.beta1 + grad * (1.0 - self.beta1),
            None => grad * (1.0 - self.beta1),
        };
        let v = match self.moment2.take() {
            Some(v) => v * self.beta2 + grad.mapv(|g| g * g) * (1.0 - self.beta2),
            None => grad.mapv(|g| g * g) * (1.0 - self.beta2),
        };
        let m_hat = &m / (1.0 - self.beta1.powi(t));
        let v_hat = &v / (1.0 - self.beta2.powi(t));
        let update = &m_hat / &(v_hat.mapv(f64::sqrt) + self.eps);
        self.moment1 = Some(m);
        self.moment2 = Some(v);
        param - &(update * self.learning_rate)
    }
}

impl<O> Solver<O, IterState<Theta, Grad, (), (), (), f64>> for Adam
where
    O: CostFunction<Param = Theta, Output = f64> + Gradient<Param = Theta, Gradient = Grad>,
{
    const NAME: &'static str = "Adam";

    fn init(
        &mut self, problem: &mut Problem<O>, state: IterState<Theta, Grad, (), (), (), f64>,
    ) -> Result<(IterState<Theta, Grad, (), (), (), f64>, Option<KV>), Error> {
        let param = state.get_param().cloned().ok_or_else(|| ArgminError::NotInitialized {
            text: "Adam requires an initial parameter vector".to_string(),
        })?;
        let cost = problem.cost(&param)?;
        self.moment1 = None;
        self.moment2 = None;
        self.nr_conv = 0;
        Ok((state.param(param).cost(cost), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, mut state: IterState<Theta, Grad, (), (), (), f64>,
    ) -> Result<(IterState<Theta, Grad, (), (), (), f64>, Option<KV>), Error> {
        let param = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "Adam lost its parameter vector".to_string(),
        })?;
        let sse_old = state.get_cost();
        let grad = problem.gradient(&param)?;
        let t = i32::try_from(state.get_iter() + 1).unwrap_or(i32::MAX);
        let new_param = self.step(&param, &grad, t);
        let sse = problem.cost(&new_param)?;
        self.record_epoch(sse_old, sse);
        Ok((state.param(new_param).gradient(grad).cost(sse), None))
    }

    fn terminate(&mut self, state: &IterState<Theta, Grad, (), (), (), f64>) -> TerminationStatus {
        if state.get_iter() >= self.epochs_min && self.nr_conv >= self.nr_conv_min {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}

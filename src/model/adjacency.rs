//! model::adjacency — identification masks, solved model, and direct effects.
//!
//! Purpose
//! -------
//! Wrap a [`DifferentiableModel`] into the objects the effects and
//! estimation code consume: the identification matrices `idx`, `idy`, a
//! numeric model that solves the endogenous variables for given exogenous
//! values (optionally shifting one equation by an additive bias), and direct
//! effects evaluated at the solved point.
//!
//! Key behaviors
//! -------------
//! - [`Adjacency::new`] binarizes the dependency patterns, rejects
//!   self-loops, and orders the equations topologically; a cycle is an
//!   error.
//! - [`Adjacency::solve`] substitutes equations in topological order.
//! - [`Adjacency::model`] solves column by column over an `m×tau` sample.
//! - [`Adjacency::direct_effects`] evaluates `(mx, my)` at `(x, y(x))`,
//!   masked by `(idx, idy)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The y-graph is acyclic, so substitution in topological order yields
//!   the unique solution, and `I − my` is invertible for every `my` on the
//!   `idy` support.
//! - The bias of equation `bias_ind` is added before its value is
//!   substituted into downstream equations.
use crate::{
    effects::identification::digital,
    model::{
        equations::DifferentiableModel,
        errors::{ModelError, ModelResult},
    },
};
use ndarray::{Array1, Array2, Axis};
use std::collections::VecDeque;

/// Identified equation system.
#[derive(Debug, Clone)]
pub struct Adjacency<M: DifferentiableModel> {
    equations: M,
    idx: Array2<f64>,
    idy: Array2<f64>,
    order: Vec<usize>,
}

impl<M: DifferentiableModel> Adjacency<M> {
    /// Build identification masks and a solve order for `equations`.
    ///
    /// Errors
    /// ------
    /// - `ModelError::EquationDimMismatch` if the patterns disagree with
    ///   `xdim` / `ydim`.
    /// - `ModelError::SelfLoop` if an equation depends on its own variable.
    /// - `ModelError::Cyclic` if the endogenous dependencies contain a cycle.
    pub fn new(equations: M) -> ModelResult<Self> {
        let (n, m) = (equations.ydim(), equations.xdim());
        let (idx, idy) = equations.dependence();
        let (idx, idy) = (digital(&idx), digital(&idy));
        if idx.dim() != (n, m) {
            return Err(ModelError::EquationDimMismatch {
                which: "exogenous dependencies",
                expected: n * m,
                found: idx.len(),
            });
        }
        if idy.dim() != (n, n) {
            return Err(ModelError::EquationDimMismatch {
                which: "endogenous dependencies",
                expected: n * n,
                found: idy.len(),
            });
        }
        if let Some(index) = (0..n).find(|&i| idy[[i, i]] != 0.0) {
            return Err(ModelError::SelfLoop { index });
        }
        let order = topological_order(&idy)?;
        log::debug!("equation solve order {order:?}");
        Ok(Self { equations, idx, idy, order })
    }

    pub fn idx(&self) -> &Array2<f64> {
        &self.idx
    }

    pub fn idy(&self) -> &Array2<f64> {
        &self.idy
    }

    /// Equation indices with every dependency before its dependents.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn equations(&self) -> &M {
        &self.equations
    }

    pub fn ndim(&self) -> usize {
        self.idy.nrows()
    }

    pub fn mdim(&self) -> usize {
        self.idx.ncols()
    }

    /// Solve `y` for exogenous values `x`, adding `bias` to equation
    /// `bias_ind`.
    ///
    /// Errors
    /// ------
    /// - `ModelError::ExogenousDimMismatch` if `x.len() != m`.
    /// - `ModelError::InvalidBiasIndex` if `bias_ind >= n`.
    /// - `ModelError::EquationDimMismatch` if the equations return other
    ///   than `n` values.
    /// - `ModelError::NonFiniteEvaluation` if an equation evaluates to a
    ///   non-finite value.
    pub fn solve(&self, x: &Array1<f64>, bias: f64, bias_ind: usize) -> ModelResult<Array1<f64>> {
        let n = self.ndim();
        if x.len() != self.mdim() {
            return Err(ModelError::ExogenousDimMismatch { expected: self.mdim(), found: x.len() });
        }
        if bias_ind >= n {
            return Err(ModelError::InvalidBiasIndex { index: bias_ind, ndim: n });
        }
        let mut y = Array1::<f64>::zeros(n);
        for &i in &self.order {
            let rhs = self.equations.evaluate(x, &y);
            if rhs.len() != n {
                return Err(ModelError::EquationDimMismatch {
                    which: "equation values",
                    expected: n,
                    found: rhs.len(),
                });
            }
            let mut value = rhs[i];
            if i == bias_ind {
                value += bias;
            }
            if !value.is_finite() {
                return Err(ModelError::NonFiniteEvaluation { equation: i });
            }
            y[i] = value;
        }
        Ok(y)
    }

    /// Solve the model for every column of `xdat` (`m×tau`), returning
    /// `yhat` (`n×tau`).
    ///
    /// # Errors
    /// Same as [`Adjacency::solve`].
    pub fn model(&self, xdat: &Array2<f64>, bias: f64, bias_ind: usize) -> ModelResult<Array2<f64>> {
        if xdat.nrows() != self.mdim() {
            return Err(ModelError::ExogenousDimMismatch {
                expected: self.mdim(),
                found: xdat.nrows(),
            });
        }
        let mut yhat = Array2::<f64>::zeros((self.ndim(), xdat.ncols()));
        for (x, mut y) in xdat.axis_iter(Axis(1)).zip(yhat.axis_iter_mut(Axis(1))) {
            y.assign(&self.solve(&x.to_owned(), bias, bias_ind)?);
        }
        Ok(yhat)
    }

    /// Direct effects `(mx, my)` at `x` and the consistent `y(x)`, masked by
    /// the identification matrices.
    ///
    /// # Errors
    /// - `ModelError::EquationDimMismatch` if the derivatives are not shaped
    ///   like `idx` and `idy`.
    /// - Propagates [`Adjacency::solve`] and derivative errors.
    pub fn direct_effects(&self, x: &Array1<f64>) -> ModelResult<(Array2<f64>, Array2<f64>)> {
        let y = self.solve(x, 0.0, 0)?;
        let (mx, my) = self.equations.derivatives(x, &y)?;
        if mx.dim() != self.idx.dim() {
            return Err(ModelError::EquationDimMismatch {
                which: "exogenous derivatives",
                expected: self.idx.len(),
                found: mx.len(),
            });
        }
        if my.dim() != self.idy.dim() {
            return Err(ModelError::EquationDimMismatch {
                which: "endogenous derivatives",
                expected: self.idy.len(),
                found: my.len(),
            });
        }
        Ok((mx * &self.idx, my * &self.idy))
    }
}

// ---- Helper methods ----

/// Kahn ordering of the endogenous graph; `idy[i, j] != 0` is an edge
/// `j → i`.
fn topological_order(idy: &Array2<f64>) -> ModelResult<Vec<usize>> {
    let n = idy.nrows();
    let mut in_degree: Vec<usize> =
        (0..n).map(|i| (0..n).filter(|&j| idy[[i, j]] != 0.0).count()).collect();
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(j) = queue.pop_front() {
        order.push(j);
        for i in 0..n {
            if idy[[i, j]] != 0.0 {
                in_degree[i] -= 1;
                if in_degree[i] == 0 {
                    queue.push_back(i);
                }
            }
        }
    }
    if order.len() != n {
        let remaining = (0..n).filter(|&i| in_degree[i] > 0).collect();
        return Err(ModelError::Cyclic { remaining });
    }
    Ok(order)
}

//! ad_estimator::engine — reverse-mode differentiation of the structural network.
//!
//! Purpose
//! -------
//! Evaluate the weighted least-squares objective of an identified linear
//! structural model and its exact gradient with respect to the full
//! direct-effect matrices, plus the Hessian over the free coefficients.
//!
//! Key behaviors
//! -------------
//! - [`AutodiffEngine`] splits differentiation into a forward pass that
//!   records a cache and a backward pass that propagates adjoints.
//! - [`StructuralNet`] implements it for `θ = [vec_F(my); vec_F(mx)]`:
//!   forward masks, inverts `I − my`, forms `ex = ey·mx` and the manifest
//!   residuals; backward applies the adjoints of product and inverse and
//!   re-masks.
//! - [`StructuralNet::hessian`] differentiates the gathered reverse-mode
//!   gradient by central finite differences and symmetrizes.
//!
//! Invariants & assumptions
//! ------------------------
//! - `idx` and `idy` are binary; `idy` has a zero diagonal.
//! - `selwei` is symmetric (a diagonal weight matrix in practice).
//! - Gradient entries outside the identified support are exactly zero.
//!
//! Conventions
//! -----------
//! - Objective: `tr(errᵀ·selwei·err) + alpha·direct·direct` with
//!   `err = fym·ex·xcdat − ymcdat`.
//! - The Hessian is taken over the free vector in `directvec_alg` order.
//!
//! Testing notes
//! -------------
//! - Unit tests compare the backward pass with finite differences, check
//!   that off-support gradients vanish, and that the Hessian is symmetric.
use crate::{
    effects::{
        directmat, directvec_alg, total_effects_alg,
        total::check_shape,
        vectorize::{flatten_col_major, unflatten_col_major},
    },
    optimization::{
        errors::{OptError, OptResult},
        minimizer::{Grad, Theta, finite_diff::compute_hessian, types::Hessian},
    },
};
use ndarray::{Array1, Array2, concatenate, s, Axis};
use std::cell::RefCell;

/// Reverse-mode differentiation capability for a scalar objective.
///
/// - `forward` evaluates the objective and records intermediates.
/// - `value` reads the objective from a cache.
/// - `backward` returns `∂objective/∂θ` from a cache.
/// - `hessian` returns the Hessian over the free coefficient vector.
pub trait AutodiffEngine {
    type Cache;

    /// Length of the full parameter vector `θ`.
    fn param_len(&self) -> usize;

    /// Binary mask over `θ`; `1.0` marks free coefficients.
    fn support_mask(&self) -> &Theta;

    fn forward(&self, theta: &Theta) -> OptResult<Self::Cache>;
    fn value(&self, cache: &Self::Cache) -> f64;
    fn backward(&self, cache: &Self::Cache) -> Grad;
    fn hessian(&self, direct: &Array1<f64>) -> OptResult<Hessian>;
}

/// Intermediates of one forward pass.
#[derive(Debug, Clone)]
pub struct NetCache {
    pub mx: Array2<f64>,
    pub my: Array2<f64>,
    pub ex: Array2<f64>,
    pub ey: Array2<f64>,
    pub err: Array2<f64>,
    pub sse: f64,
    pub penalty: f64,
}

/// Identified linear structural network over centered data.
///
/// Fields are fixed at construction; only `θ` varies between passes.
#[derive(Debug, Clone)]
pub struct StructuralNet {
    idx: Array2<f64>,
    idy: Array2<f64>,
    xcdat: Array2<f64>,
    ymcdat: Array2<f64>,
    fym: Array2<f64>,
    selwei: Array2<f64>,
    alpha: f64,
    mask: Theta,
}

impl StructuralNet {
    /// Build a network from identification masks and centered data.
    ///
    /// Parameters
    /// ----------
    /// - `idx` (`n×m`), `idy` (`n×n`): binary identification masks.
    /// - `xcdat` (`m×tau`): centered exogenous observations.
    /// - `ymcdat` (`p×tau`): centered manifest endogenous observations.
    /// - `fym` (`p×n`): manifest selection matrix.
    /// - `selwei` (`p×p`): residual weights.
    /// - `alpha`: Tikhonov weight, `≥ 0`.
    ///
    /// Errors
    /// ------
    /// - `OptError::Effects(DimensionMismatch)` for inconsistent shapes.
    /// - `OptError::InvalidTikhonov` for a negative or non-finite `alpha`.
    pub fn new(
        idx: Array2<f64>, idy: Array2<f64>, xcdat: Array2<f64>, ymcdat: Array2<f64>,
        fym: Array2<f64>, selwei: Array2<f64>, alpha: f64,
    ) -> OptResult<Self> {
        let (n, m) = idx.dim();
        let (p, tau) = ymcdat.dim();
        check_shape("idy", &idy, (n, n))?;
        check_shape("xcdat", &xcdat, (m, tau))?;
        check_shape("fym", &fym, (p, n))?;
        check_shape("selwei", &selwei, (p, p))?;
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(OptError::InvalidTikhonov { alpha });
        }
        let mask = concatenate![Axis(0), flatten_col_major(&idy), flatten_col_major(&idx)];
        Ok(Self { idx, idy, xcdat, ymcdat, fym, selwei, alpha, mask })
    }

    pub fn idx(&self) -> &Array2<f64> {
        &self.idx
    }

    pub fn idy(&self) -> &Array2<f64> {
        &self.idy
    }

    pub fn ndim(&self) -> usize {
        self.idy.nrows()
    }

    pub fn mdim(&self) -> usize {
        self.idx.ncols()
    }

    /// Pack `(mx, my)` into `θ = [vec_F(my); vec_F(mx)]`.
    pub fn pack(&self, mx: &Array2<f64>, my: &Array2<f64>) -> Theta {
        concatenate![Axis(0), flatten_col_major(my), flatten_col_major(mx)]
    }

    /// Unpack `θ` into `(mx, my)` without masking.
    ///
    /// # Errors
    /// `OptError::ParamLengthMismatch` if `θ` has the wrong length.
    pub fn unpack(&self, theta: &Theta) -> OptResult<(Array2<f64>, Array2<f64>)> {
        let (n, m) = (self.ndim(), self.mdim());
        if theta.len() != self.param_len() {
            return Err(OptError::ParamLengthMismatch {
                expected: self.param_len(),
                found: theta.len(),
            });
        }
        let my = unflatten_col_major(theta.slice(s![..n * n]).to_vec().as_slice(), n, n);
        let mx = unflatten_col_major(theta.slice(s![n * n..]).to_vec().as_slice(), n, m);
        Ok((mx, my))
    }

    /// Free coefficients of `θ`, read through the support mask.
    ///
    /// Yields the same order as `directvec_alg` on the unpacked matrices.
    ///
    /// # Errors
    /// `OptError::ParamLengthMismatch` if `θ` has the wrong length.
    pub fn free_coefficients(&self, theta: &Theta) -> OptResult<Array1<f64>> {
        if theta.len() != self.param_len() {
            return Err(OptError::ParamLengthMismatch {
                expected: self.param_len(),
                found: theta.len(),
            });
        }
        Ok(theta.iter().zip(self.mask.iter()).filter(|&(_, &m)| m == 1.0).map(|(&v, _)| v).collect())
    }

    /// Gradient of the objective over the free vector.
    fn direct_gradient(&self, direct: &Array1<f64>) -> OptResult<Array1<f64>> {
        let (mx, my) = directmat(direct, &self.idx, &self.idy)?;
        let cache = self.forward(&self.pack(&mx, &my))?;
        let (gmx, gmy) = self.unpack(&self.backward(&cache))?;
        Ok(directvec_alg(&gmx, &gmy, &self.idx, &self.idy)?)
    }
}

impl AutodiffEngine for StructuralNet {
    type Cache = NetCache;

    fn param_len(&self) -> usize {
        self.ndim() * (self.ndim() + self.mdim())
    }

    fn support_mask(&self) -> &Theta {
        &self.mask
    }

    fn forward(&self, theta: &Theta) -> OptResult<NetCache> {
        let (mx, my) = self.unpack(theta)?;
        let mx = mx * &self.idx;
        let my = my * &self.idy;
        let (ex, ey) = total_effects_alg(&mx, &my, None, None)?;
        let ychat = ex.dot(&self.xcdat);
        let err = self.fym.dot(&ychat) - &self.ymcdat;
        let sse = (&err * &self.selwei.dot(&err)).sum();
        let penalty = self.alpha * (mx.iter().map(|v| v * v).sum::<f64>()
            + my.iter().map(|v| v * v).sum::<f64>());
        Ok(NetCache { mx, my, ex, ey, err, sse, penalty })
    }

    fn value(&self, cache: &NetCache) -> f64 {
        cache.sse + cache.penalty
    }

    fn backward(&self, cache: &NetCache) -> Grad {
        // d/d err of tr(errᵀ S err) is (S + Sᵀ) err.
        let g_err = self.selwei.dot(&cache.err) + self.selwei.t().dot(&cache.err);
        let g_ychat = self.fym.t().dot(&g_err);
        let g_ex = g_ychat.dot(&self.xcdat.t());
        let ey_t = cache.ey.t();
        let g_mx = (ey_t.dot(&g_ex) + 2.0 * self.alpha * &cache.mx) * &self.idx;
        let g_ey = g_ex.dot(&cache.mx.t());
        let g_my = (ey_t.dot(&g_ey).dot(&ey_t) + 2.0 * self.alpha * &cache.my) * &self.idy;
        self.pack(&g_mx, &g_my)
    }

    fn hessian(&self, direct: &Array1<f64>) -> OptResult<Hessian> {
        let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
        let grad_fn = |d: &Theta| -> Grad {
            match self.direct_gradient(d) {
                Ok(g) => g,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    Array1::from_elem(d.len(), f64::NAN)
                }
            }
        };
        let hess = compute_hessian(&grad_fn, direct);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        hess
    }
}

/// Hessian of the objective at `(mx, my)` over the free coefficients.
///
/// # Errors
/// Propagates forward-pass and validation errors from
/// [`AutodiffEngine::hessian`].
pub fn sse_hess(net: &StructuralNet, mx: &Array2<f64>, my: &Array2<f64>) -> OptResult<Hessian> {
    let direct = directvec_alg(mx, my, net.idx(), net.idy())?;
    net.hessian(&direct)
}

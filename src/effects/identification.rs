//! effects::identification — binary identification matrices.
//!
//! Purpose
//! -------
//! Derive the sparsity patterns of total and mediation effects from the
//! direct-effect patterns `idx`, `idy`, by running the effects algebra on the
//! patterns themselves (treating every 1 as a generic nonzero effect) and
//! re-binarizing the result.
//!
//! Key behaviors
//! -------------
//! - [`digital`] / [`digital_vec`] binarize matrices and vectors.
//! - [`compute_ed`] yields the total-effect patterns `(edx, edy)`.
//! - [`compute_fd`] yields the mediation patterns `(fdxj, fdyj, fdx, fdy)`.
//! - [`Identification`] bundles all patterns and support counts for a model.
//!
//! Invariants & assumptions
//! ------------------------
//! - `idy` must have a zero diagonal; a self-loop is surfaced as
//!   `EffectsError::NotNormalized` by the underlying total-effects call.
//! - For acyclic patterns, `I − idy` is unit triangular after permutation and
//!   therefore always invertible; all entries of its inverse are
//!   nonnegative path counts, so no accidental cancellation can occur.
use crate::effects::{
    errors::EffectsResult,
    mediation::compute_mediation_effects,
    total::{check_shape, total_effects_alg},
    vectorize::count_support,
};
use ndarray::{Array1, Array2};

/// 1.0 where `mat` is nonzero, 0.0 elsewhere.
pub fn digital(mat: &Array2<f64>) -> Array2<f64> {
    mat.mapv(|v| if v != 0.0 { 1.0 } else { 0.0 })
}

/// Vector counterpart of [`digital`].
pub fn digital_vec(vec: &Array1<f64>) -> Array1<f64> {
    vec.mapv(|v| if v != 0.0 { 1.0 } else { 0.0 })
}

/// Total-effect identification matrices `(edx, edy)` from `(idx, idy)`.
///
/// # Errors
/// Propagates `EffectsError` from [`total_effects_alg`] (self-loops in
/// `idy`, singular pattern systems, shape mismatches).
pub fn compute_ed(
    idx: &Array2<f64>, idy: &Array2<f64>,
) -> EffectsResult<(Array2<f64>, Array2<f64>)> {
    let (edx, edy) = total_effects_alg(idx, idy, None, None)?;
    Ok((digital(&edx), digital(&edy)))
}

/// Mediation identification patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct MediationPattern {
    pub fdxj: Array1<f64>,
    pub fdyj: Array1<f64>,
    pub fdx: Array2<f64>,
    pub fdy: Array2<f64>,
}

/// Mediation identification matrices for `final_var`.
///
/// # Errors
/// Propagates [`compute_ed`] errors and `EffectsError::UnknownVariable`.
pub fn compute_fd<S: AsRef<str>>(
    idx: &Array2<f64>, idy: &Array2<f64>, yvars: &[S], final_var: &str,
) -> EffectsResult<MediationPattern> {
    let (edx, edy) = compute_ed(idx, idy)?;
    let med = compute_mediation_effects(idx, idy, &edx, &edy, yvars, final_var)?;
    Ok(MediationPattern {
        fdxj: digital_vec(&med.exj),
        fdyj: digital_vec(&med.eyj),
        fdx: digital(&med.eyx),
        fdy: digital(&med.eyy),
    })
}

/// Identification bundle threaded through estimation and inference.
///
/// Holds the direct patterns, the derived total and mediation patterns, and
/// the support counts `qxdim = |idx|₁`, `qydim = |idy|₁`, `qdim = qx + qy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub idx: Array2<f64>,
    pub idy: Array2<f64>,
    pub edx: Array2<f64>,
    pub edy: Array2<f64>,
    pub fdxj: Array1<f64>,
    pub fdyj: Array1<f64>,
    pub fdx: Array2<f64>,
    pub fdy: Array2<f64>,
    pub qxdim: usize,
    pub qydim: usize,
    pub qdim: usize,
}

impl Identification {
    /// Build the bundle from direct-effect patterns.
    ///
    /// Inputs are binarized first, so direct-effect values may be passed in
    /// place of masks.
    ///
    /// # Errors
    /// - `EffectsError::DimensionMismatch` if `idy` is not `n×n` with
    ///   `n = idx.nrows()`.
    /// - Propagates [`compute_ed`] / [`compute_fd`] errors.
    pub fn new<S: AsRef<str>>(
        idx: &Array2<f64>, idy: &Array2<f64>, yvars: &[S], final_var: &str,
    ) -> EffectsResult<Self> {
        let ndim = idx.nrows();
        check_shape("idy", idy, (ndim, ndim))?;
        let idx = digital(idx);
        let idy = digital(idy);
        let (edx, edy) = compute_ed(&idx, &idy)?;
        let pattern = compute_fd(&idx, &idy, yvars, final_var)?;
        let qxdim = count_support(&idx);
        let qydim = count_support(&idy);
        Ok(Self {
            idx,
            idy,
            edx,
            edy,
            fdxj: pattern.fdxj,
            fdyj: pattern.fdyj,
            fdx: pattern.fdx,
            fdy: pattern.fdy,
            qxdim,
            qydim,
            qdim: qxdim + qydim,
        })
    }

    /// Number of endogenous variables `n`.
    pub fn ndim(&self) -> usize {
        self.idx.nrows()
    }

    /// Number of exogenous variables `m`.
    pub fn mdim(&self) -> usize {
        self.idx.ncols()
    }

    /// Number of identified total effects, `|edy|₁ + |edx|₁`.
    pub fn effects_dim(&self) -> usize {
        count_support(&self.edy) + count_support(&self.edx)
    }
}

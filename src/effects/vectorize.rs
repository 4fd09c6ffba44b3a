//! effects::vectorize — bijection between sparse coefficient matrices and
//! the free coefficient vector.
//!
//! Purpose
//! -------
//! Convert between a pair of direct-effect matrices `(mx, my)` and the
//! dense vector of their free (identified) entries, and build the linear
//! embedding operators used by the delta-method Jacobian.
//!
//! Key behaviors
//! -------------
//! - [`support`] enumerates the positions where a mask equals one in
//!   **column-major** order (rows top to bottom within each column, columns
//!   left to right). Every other routine here, and the estimator's gradient
//!   gather/scatter, goes through this single enumeration.
//! - [`directvec_alg`] gathers `my` entries at `idy == 1`, then `mx` entries
//!   at `idx == 1`.
//! - [`directmat`] is its inverse on the identified support.
//! - [`vecmat`] embeds the nonzero entries of a matrix into its full
//!   column-major flattening.
//! - [`total_from_direct`] composes `directmat`, `total_effects_alg`, and
//!   `directvec_alg` into the map differentiated by the delta method.
//!
//! Invariants & assumptions
//! ------------------------
//! - `directmat(directvec_alg(mx, my, idx, idy), idx, idy) == (mx ⊙ idx, my ⊙ idy)`.
//! - Masks are binary (`0.0`/`1.0`); see `identification::digital`.
//!
//! Conventions
//! -----------
//! - The free vector lists the `qy = |idy|₁` endogenous coefficients first,
//!   then the `qx = |idx|₁` exogenous coefficients.
//! - Flattening is column-major (`vec_F`) to match the Kronecker identities
//!   `vec_F(A X B) = (Bᵀ ⊗ A) vec_F(X)`.
use crate::effects::{
    errors::{EffectsError, EffectsResult},
    total::{check_shape, total_effects_alg},
};
use ndarray::{Array1, Array2};

/// Column-major positions `(row, col)` at which `mask` is nonzero.
pub fn support(mask: &Array2<f64>) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    for j in 0..mask.ncols() {
        for i in 0..mask.nrows() {
            if mask[[i, j]] != 0.0 {
                positions.push((i, j));
            }
        }
    }
    positions
}

/// Number of identified entries in `mask`.
pub fn count_support(mask: &Array2<f64>) -> usize {
    mask.iter().filter(|&&v| v != 0.0).count()
}

/// Column-major flattening `vec_F(mat)`.
pub fn flatten_col_major(mat: &Array2<f64>) -> Array1<f64> {
    mat.t().iter().copied().collect()
}

/// Inverse of [`flatten_col_major`] for a `rows × cols` target.
pub fn unflatten_col_major(vec: &[f64], rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| vec[j * rows + i])
}

/// directvec_alg — gather the free coefficient vector.
///
/// Purpose
/// -------
/// Collect the entries of `my` at `idy == 1` followed by the entries of
/// `mx` at `idx == 1`, each in column-major order.
///
/// Parameters
/// ----------
/// - `mx`: `&Array2<f64>` (`n×m`) exogenous direct effects.
/// - `my`: `&Array2<f64>` (`n×n`) endogenous direct effects.
/// - `idx`: `&Array2<f64>` (`n×m`) binary mask for `mx`.
/// - `idy`: `&Array2<f64>` (`n×n`) binary mask for `my`.
///
/// Returns
/// -------
/// `EffectsResult<Array1<f64>>` of length `qy + qx`.
///
/// Errors
/// ------
/// - `EffectsError::DimensionMismatch` if `idx` is not shaped like `mx`, or
///   `idy` like `my`.
///
/// Notes
/// -----
/// - Also used on total effects with `(edx, edy)` masks, in which case the
///   diagonal of `ey` is part of the gathered vector.
pub fn directvec_alg(
    mx: &Array2<f64>, my: &Array2<f64>, idx: &Array2<f64>, idy: &Array2<f64>,
) -> EffectsResult<Array1<f64>> {
    check_shape("idx", idx, mx.dim())?;
    check_shape("idy", idy, my.dim())?;
    let directy = support(idy).into_iter().map(|(i, j)| my[[i, j]]);
    let directx = support(idx).into_iter().map(|(i, j)| mx[[i, j]]);
    Ok(directy.chain(directx).collect())
}

/// directmat — scatter the free coefficient vector into matrices.
///
/// Purpose
/// -------
/// Inverse of [`directvec_alg`]: fill zero `n×m` and `n×n` matrices at the
/// identified positions, consuming `direct` in the same column-major order.
///
/// Parameters
/// ----------
/// - `direct`: `&Array1<f64>` free coefficients, `my` part first.
/// - `idx`: `&Array2<f64>` (`n×m`) binary mask for `mx`.
/// - `idy`: `&Array2<f64>` (`n×n`) binary mask for `my`.
///
/// Returns
/// -------
/// `EffectsResult<(Array2<f64>, Array2<f64>)>` as `(mx, my)`.
///
/// Errors
/// ------
/// - `EffectsError::DirectLengthMismatch` when `direct.len() != qx + qy`.
pub fn directmat(
    direct: &Array1<f64>, idx: &Array2<f64>, idy: &Array2<f64>,
) -> EffectsResult<(Array2<f64>, Array2<f64>)> {
    let supp_y = support(idy);
    let supp_x = support(idx);
    let expected = supp_y.len() + supp_x.len();
    if direct.len() != expected {
        return Err(EffectsError::DirectLengthMismatch { expected, found: direct.len() });
    }
    let mut my = Array2::<f64>::zeros(idy.raw_dim());
    let mut mx = Array2::<f64>::zeros(idx.raw_dim());
    let mut values = direct.iter();
    for (pos, value) in supp_y.into_iter().zip(values.by_ref()) {
        my[pos] = *value;
    }
    for (pos, value) in supp_x.into_iter().zip(values) {
        mx[pos] = *value;
    }
    Ok((mx, my))
}

/// vecmat — embedding of the nonzero entries of `mz` into `vec_F(mz)`.
///
/// Builds the `(rows·cols) × nnz(mz)` matrix `V` whose k-th column has a
/// single nonzero, equal to the k-th nonzero entry of `mz` (column-major),
/// at that entry's flattened position. For a binary mask, `V` maps the free
/// coefficients of that mask to the full column-major flattening.
pub fn vecmat(mz: &Array2<f64>) -> Array2<f64> {
    let rows = mz.nrows();
    let positions = support(mz);
    let mut vec_mat = Array2::<f64>::zeros((rows * mz.ncols(), positions.len()));
    for (k, (i, j)) in positions.into_iter().enumerate() {
        vec_mat[[j * rows + i, k]] = mz[[i, j]];
    }
    vec_mat
}

/// total_from_direct — effects vector as a function of the free coefficients.
///
/// Purpose
/// -------
/// Evaluate the map `direct ↦ vec(identified total effects)` used both by
/// the numeric Jacobian cross-check and by callers who need the effects in
/// vector form: scatter with `(idx, idy)`, compute total effects masked by
/// `(edx, edy)`, and gather with `(edx, edy)`.
///
/// Returns
/// -------
/// `EffectsResult<Array1<f64>>` of length `|edy|₁ + |edx|₁`.
///
/// Errors
/// ------
/// - Propagates [`directmat`] and [`total_effects_alg`] errors.
pub fn total_from_direct(
    direct: &Array1<f64>, idx: &Array2<f64>, idy: &Array2<f64>, edx: &Array2<f64>,
    edy: &Array2<f64>,
) -> EffectsResult<Array1<f64>> {
    let (mx, my) = directmat(direct, idx, idy)?;
    let (ex, ey) = total_effects_alg(&mx, &my, Some(edx), Some(edy))?;
    directvec_alg(&ex, &ey, edx, edy)
}

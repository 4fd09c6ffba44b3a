//! Dense linear-algebra helpers shared by the effects algebra, the
//! estimator, and inference.
//!
//! `ndarray` is the storage format throughout the crate; `nalgebra` is used
//! only at the boundary for LU inversion and symmetric eigendecomposition.
//! Helpers here copy into a `DMatrix`, run the factorization, and copy back.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: eigenvalue cutoff for pseudoinverses.
//! - [`fill_dmatrix`]: copy an `ndarray` matrix into a preallocated `DMatrix`.
//! - [`invert`]: checked inverse of a square matrix.
//! - [`sym_pseudo_inverse`]: Moore–Penrose pseudoinverse of a symmetric matrix.
//! - [`relative_accuracy`]: scale-free distance between two matrices.
use nalgebra::DMatrix;
use ndarray::Array2;

/// Eigenvalues at or below this threshold are treated as zero when forming
/// pseudoinverse directions.
pub const EIGEN_EPS: f64 = 1e-10;

/// Copy `src` into the preallocated `dst`, column by column.
///
/// Panics if the two matrices differ in shape.
pub fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    for j in 0..src.ncols() {
        for i in 0..src.nrows() {
            dst[(i, j)] = src[[i, j]];
        }
    }
}

fn to_dmatrix(src: &Array2<f64>) -> DMatrix<f64> {
    let mut dst = DMatrix::<f64>::zeros(src.nrows(), src.ncols());
    fill_dmatrix(src, &mut dst);
    dst
}

fn from_dmatrix(src: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((src.nrows(), src.ncols()), |(i, j)| src[(i, j)])
}

/// invert — checked inverse of a square matrix.
///
/// Purpose
/// -------
/// Invert `mat` via LU decomposition and reject results that are not
/// finite, so that near-singular systems are reported instead of
/// propagating `inf`/`NaN` downstream.
///
/// Parameters
/// ----------
/// - `mat`: `&Array2<f64>`
///   Square matrix to invert.
///
/// Returns
/// -------
/// `Option<Array2<f64>>`
///   - `Some(inv)` when the factorization succeeds and every entry of the
///     inverse is finite.
///   - `None` when `mat` is not square, is singular, or the inverse
///     contains non-finite entries.
///
/// Notes
/// -----
/// - Callers map `None` to their own error variant (e.g.
///   `EffectsError::SingularSystem`).
pub fn invert(mat: &Array2<f64>) -> Option<Array2<f64>> {
    if mat.nrows() != mat.ncols() {
        return None;
    }
    let inv = to_dmatrix(mat).try_inverse()?;
    if inv.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(from_dmatrix(&inv))
}

/// sym_pseudo_inverse — eigen-truncated pseudoinverse of a symmetric matrix.
///
/// Purpose
/// -------
/// Compute `H⁺ = Q diag(1/λ_k) Qᵀ` over eigenvalues `λ_k > EIGEN_EPS`,
/// where `H = Q Λ Qᵀ` is the symmetric eigendecomposition. Directions with
/// non-positive or negligible curvature are dropped.
///
/// Parameters
/// ----------
/// - `mat`: `&Array2<f64>`
///   Symmetric `q×q` matrix (typically a symmetrized Hessian).
///
/// Returns
/// -------
/// `Array2<f64>`
///   The `q×q` pseudoinverse. A matrix with no eigenvalue above
///   [`EIGEN_EPS`] yields the zero matrix.
///
/// Panics
/// ------
/// - May panic if `mat` is not square.
pub fn sym_pseudo_inverse(mat: &Array2<f64>) -> Array2<f64> {
    let n = mat.nrows();
    let eigen = to_dmatrix(mat).symmetric_eigen();
    let q = eigen.eigenvectors;
    let lambdas = eigen.eigenvalues;
    let mut pinv = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in lambdas.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for i in 0..n {
            let qik = q[(i, k)] / lambda;
            for j in 0..n {
                pinv[[i, j]] += qik * q[(j, k)];
            }
        }
    }
    pinv
}

/// relative_accuracy — scale-free deviation between two matrices.
///
/// Returns `‖a − b‖ / ‖a + b‖` in the Frobenius norm, with the degenerate
/// cases `0` when both norms vanish and `+∞` when only `‖a + b‖` does.
/// Used to compare estimated against theoretical effects.
pub fn relative_accuracy(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    let diff = (a - b).mapv(|v| v * v).sum().sqrt();
    let sum = (a + b).mapv(|v| v * v).sum().sqrt();
    match (diff == 0.0, sum == 0.0) {
        (true, true) => 0.0,
        (false, true) => f64::INFINITY,
        _ => diff / sum,
    }
}

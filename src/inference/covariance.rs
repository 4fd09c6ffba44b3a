//! inference::covariance — coefficient covariance from the objective Hessian.
//!
//! Purpose
//! -------
//! Turn the Hessian of the weighted least-squares objective at the estimate
//! into a covariance matrix for the free direct-effect coefficients, and
//! map its diagonal back into standard-error matrices shaped like `mx` and
//! `my`.
//!
//! Key behaviors
//! -------------
//! - [`coefficient_covariance`] scales the eigen-truncated pseudoinverse of
//!   the Hessian: `vcm = 2·σ̂²·H⁺` with `σ̂² = sse / (nobs − qdim)`.
//! - [`compute_direct_std`] takes `sqrt(diag(vcm))` and scatters it through
//!   the identification masks.
//! - [`std_from_variances`] is the square root shared with the delta
//!   method: negative variances within rounding are clamped to zero with a
//!   warning, larger ones are errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - The Hessian is symmetric (it is symmetrized by the finite-difference
//!   helpers); no re-symmetrization happens here.
//! - Eigenvalues at or below `EIGEN_EPS` are treated as non-identified
//!   directions and contribute zero variance.
//!
//! Conventions
//! -----------
//! - The objective is a sum of squares, so `H ≈ 2·JᵀWJ`; the factor `2`
//!   recovers the usual least-squares covariance `σ̂²·(JᵀWJ)⁻¹`.
//! - `nobs` counts scalar residuals, `tau · pdim`.
//!
//! Testing notes
//! -------------
//! - Unit tests check the scaling on a diagonal Hessian, rank-deficient
//!   truncation, and each rejection path.
use crate::{
    effects::vectorize::directmat,
    inference::errors::{InferenceError, InferenceResult},
    optimization::numerical_stability::linalg::sym_pseudo_inverse,
};
use ndarray::{Array1, Array2};

/// Relative size, against the largest diagonal entry, below which a
/// negative variance is treated as rounding.
pub const VARIANCE_ROUNDOFF: f64 = 1e-10;

/// coefficient_covariance — covariance of free coefficients from a Hessian.
///
/// Parameters
/// ----------
/// - `hessian`: `&Array2<f64>`
///   Symmetric `qdim × qdim` Hessian of the objective at the estimate.
/// - `sse`: `f64`
///   Objective value at the estimate.
/// - `nobs`: `usize`
///   Number of scalar residuals.
/// - `qdim`: `usize`
///   Number of free coefficients.
///
/// Returns
/// -------
/// `InferenceResult<Array2<f64>>`
///   The `qdim × qdim` covariance `2·σ̂²·H⁺`.
///
/// Errors
/// ------
/// - `InferenceError::CovarianceDimMismatch` if `hessian` is not
///   `qdim × qdim`.
/// - `InferenceError::InvalidSse` if `sse` is negative or non-finite.
/// - `InferenceError::InsufficientDegreesOfFreedom` if `nobs ≤ qdim`.
pub fn coefficient_covariance(
    hessian: &Array2<f64>, sse: f64, nobs: usize, qdim: usize,
) -> InferenceResult<Array2<f64>> {
    if hessian.dim() != (qdim, qdim) {
        return Err(InferenceError::CovarianceDimMismatch { expected: qdim, found: hessian.dim() });
    }
    if !sse.is_finite() || sse < 0.0 {
        return Err(InferenceError::InvalidSse { sse });
    }
    if nobs <= qdim {
        return Err(InferenceError::InsufficientDegreesOfFreedom { nobs, qdim });
    }
    let sigma2 = sse / (nobs - qdim) as f64;
    Ok(sym_pseudo_inverse(hessian) * (2.0 * sigma2))
}

/// Standard deviations of the free coefficients, scattered into
/// `(mx_std, my_std)` through `(idx, idy)`.
///
/// # Errors
/// - `InferenceError::CovarianceDimMismatch` if `vcm` is not square.
/// - `InferenceError::InvalidVariance` from [`std_from_variances`].
/// - `InferenceError::Effects` if the diagonal length does not match the
///   identified support.
pub fn compute_direct_std(
    vcm: &Array2<f64>, idx: &Array2<f64>, idy: &Array2<f64>,
) -> InferenceResult<(Array2<f64>, Array2<f64>)> {
    let (rows, cols) = vcm.dim();
    if rows != cols {
        return Err(InferenceError::CovarianceDimMismatch { expected: rows, found: (rows, cols) });
    }
    let direct_std = std_from_variances(vcm)?;
    Ok(directmat(&direct_std, idx, idy)?)
}

/// Square roots of the diagonal of a covariance matrix.
///
/// A negative entry no larger in magnitude than
/// `VARIANCE_ROUNDOFF · max(1, max |diag|)` is rounding noise: it is logged
/// at warn level and reported as a zero standard deviation.
///
/// # Errors
/// `InferenceError::InvalidVariance` at the first non-finite entry or
/// negative entry beyond that bound.
pub fn std_from_variances(vcm: &Array2<f64>) -> InferenceResult<Array1<f64>> {
    let diag = vcm.diag();
    let scale = diag.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let tol = VARIANCE_ROUNDOFF * scale;
    let mut std = Array1::<f64>::zeros(diag.len());
    for (index, (&value, out)) in diag.iter().zip(std.iter_mut()).enumerate() {
        if !value.is_finite() || value < -tol {
            return Err(InferenceError::InvalidVariance { index, value });
        }
        if value < 0.0 {
            log::warn!("variance {value:.3e} at diagonal entry {index} clamped to zero");
        }
        *out = value.max(0.0).sqrt();
    }
    Ok(std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Scaling of the pseudoinverse by the residual variance.
    // - Zero variance along non-identified directions.
    // - Degrees-of-freedom, SSE, and shape validation.
    // - Scattering of standard deviations into matrices.
    // - Handling of negative variances in `std_from_variances`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify `vcm = 2·σ̂²·H⁻¹` on a diagonal Hessian.
    //
    // Given
    // -----
    // - `H = diag(4, 1)`, `sse = 10`, `nobs = 12`, `qdim = 2` (σ̂² = 1).
    //
    // Expect
    // ------
    // - `vcm = diag(0.5, 2)`.
    fn covariance_scales_inverse_hessian() {
        let vcm = coefficient_covariance(&array![[4.0, 0.0], [0.0, 1.0]], 10.0, 12, 2)
            .expect("valid inputs");

        assert_abs_diff_eq!(vcm[[0, 0]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(vcm[[1, 1]], 2.0, epsilon = 1e-12);
        assert!(vcm[[0, 1]].abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a flat direction receives zero variance, not infinity.
    //
    // Given
    // -----
    // - `H = diag(2, 0)`.
    //
    // Expect
    // ------
    // - `vcm[1,1] == 0` and `vcm[0,0] > 0`.
    fn covariance_drops_flat_directions() {
        let vcm = coefficient_covariance(&array![[2.0, 0.0], [0.0, 0.0]], 3.0, 5, 2)
            .expect("valid inputs");

        assert!(vcm[[0, 0]] > 0.0);
        assert_eq!(vcm[[1, 1]], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Check each rejection path.
    //
    // Given
    // -----
    // - `nobs == qdim`, a negative SSE, and a 1×1 Hessian for `qdim = 2`.
    //
    // Expect
    // ------
    // - `InsufficientDegreesOfFreedom`, `InvalidSse`, `CovarianceDimMismatch`.
    fn covariance_rejects_invalid_inputs() {
        let h = Array2::<f64>::eye(2);

        assert_eq!(
            coefficient_covariance(&h, 1.0, 2, 2),
            Err(InferenceError::InsufficientDegreesOfFreedom { nobs: 2, qdim: 2 })
        );
        assert!(matches!(
            coefficient_covariance(&h, -1.0, 10, 2),
            Err(InferenceError::InvalidSse { .. })
        ));
        assert!(matches!(
            coefficient_covariance(&Array2::eye(1), 1.0, 10, 2),
            Err(InferenceError::CovarianceDimMismatch { expected: 2, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify standard deviations land at the identified positions.
    //
    // Given
    // -----
    // - `idy` with one free entry at (1,0), `idx` with one at (0,0);
    //   `vcm = diag(4, 9)` (my part first).
    //
    // Expect
    // ------
    // - `my_std[1,0] = 2`, `mx_std[0,0] = 3`, zeros elsewhere.
    fn direct_std_scatters_through_masks() {
        let idx = array![[1.0], [0.0]];
        let idy = array![[0.0, 0.0], [1.0, 0.0]];

        let (mx_std, my_std) =
            compute_direct_std(&array![[4.0, 0.0], [0.0, 9.0]], &idx, &idy).expect("scatter");

        assert_eq!(my_std, array![[0.0, 0.0], [2.0, 0.0]]);
        assert_eq!(mx_std, array![[3.0], [0.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Check rounding-level negative variances become zero while larger
    // negative or non-finite variances are errors.
    //
    // Given
    // -----
    // - Diagonals `(4, -1e-12)`, `(4, -0.1)` and `(NaN, 1)`.
    //
    // Expect
    // ------
    // - `[2, 0]` for the first.
    // - `InvalidVariance { index: 1, value: -0.1 }` for the second.
    // - `InvalidVariance` at index 0 for the third.
    fn std_from_variances_separates_rounding_from_errors() {
        let rounding = std_from_variances(&array![[4.0, 0.3], [0.3, -1e-12]]).expect("rounding");
        let negative = std_from_variances(&array![[4.0, 0.0], [0.0, -0.1]]);
        let nan = std_from_variances(&array![[f64::NAN, 0.0], [0.0, 1.0]]);

        assert_eq!(rounding, array![2.0, 0.0]);
        assert_eq!(negative, Err(InferenceError::InvalidVariance { index: 1, value: -0.1 }));
        assert!(matches!(nan, Err(InferenceError::InvalidVariance { index: 0, .. })));
    }
}

//! inference::delta — delta-method standard errors of total effects.
//!
//! Purpose
//! -------
//! Propagate the covariance of the free direct-effect coefficients to the
//! identified total effects `(ey, ex)` through the Jacobian of the map
//! `direct ↦ vec(total effects)`, and cross-check that Jacobian against a
//! numerical one.
//!
//! Key behaviors
//! -------------
//! - [`jacobian_alg`] builds the Jacobian in closed form from Kronecker
//!   products: `d vec(ey) = (eyᵀ⊗ey)·Vy·d` and
//!   `d vec(ex) = ((exᵀ⊗ey)·Vy + (I_m⊗ey)·Vx)·d`, where `Vy`, `Vx` embed the
//!   free coefficients into `vec_F(my)`, `vec_F(mx)`.
//! - [`jacobian_num`] differentiates `total_from_direct` by central
//!   differences.
//! - [`compare_jacobians`] returns a [`JacobianCheck`]; a mismatch is logged
//!   at warn level and never raised.
//! - [`total_effects_std`] returns [`EffectsStd`] with
//!   `sqrt(diag(J·vcm·Jᵀ))` scattered through `(edx, edy)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The y-graph is acyclic, so the diagonal of `ey` does not depend on the
//!   coefficients and its rows of the Jacobian vanish; the diagonal of
//!   `ey_std` is set to zero explicitly.
//! - `vcm_coeff` is `qdim × qdim` in `directvec_alg` order.
//!
//! Conventions
//! -----------
//! - Jacobian rows follow `directvec_alg(ex, ey, edx, edy)`: the `edy`
//!   support column-major, then the `edx` support.
//! - Columns follow the free coefficients: `idy` support, then `idx`.
//!
//! Testing notes
//! -------------
//! - Unit tests check the algebraic Jacobian against the numerical one on a
//!   three-equation model, the zero diagonal of `ey_std`, and dimension
//!   errors.
use crate::{
    effects::{
        identification::Identification,
        total::total_effects_alg,
        vectorize::{directmat, support, total_from_direct, vecmat},
    },
    inference::{
        covariance::std_from_variances,
        errors::{InferenceError, InferenceResult},
    },
    optimization::{errors::OptError, minimizer::finite_diff::compute_jacobian},
};
use ndarray::{Array1, Array2, Axis, linalg::kron, s};

/// Absolute tolerance of the algebraic/numerical Jacobian comparison.
pub const JACOBIAN_ATOL: f64 = 1e-4;
/// Relative tolerance of the algebraic/numerical Jacobian comparison.
pub const JACOBIAN_RTOL: f64 = 1e-5;

/// Outcome of comparing the algebraic and numerical effects Jacobians.
///
/// `allclose` follows `|num − alg| ≤ atol + rtol·|alg|` elementwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianCheck {
    pub max_abs_diff: f64,
    pub atol: f64,
    pub allclose: bool,
}

/// Standard deviations of the identified total effects.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectsStd {
    pub ex_std: Array2<f64>,
    pub ey_std: Array2<f64>,
    /// Covariance of the identified total effects, `J·vcm·Jᵀ`.
    pub vcm_effects: Array2<f64>,
    pub jacobian_check: JacobianCheck,
}

/// jacobian_alg — closed-form Jacobian of identified total effects.
///
/// Parameters
/// ----------
/// - `direct`: `&Array1<f64>` free coefficients (`idy` part first).
/// - `ident`: `&Identification` masks and effect patterns.
///
/// Returns
/// -------
/// `InferenceResult<Array2<f64>>` of shape `(|edy| + |edx|) × qdim`.
///
/// Errors
/// ------
/// - `InferenceError::Effects` for a wrong-length `direct` or a singular
///   `I − my`.
pub fn jacobian_alg(direct: &Array1<f64>, ident: &Identification) -> InferenceResult<Array2<f64>> {
    let (n, m) = (ident.ndim(), ident.mdim());
    let (qy, q) = (ident.qydim, ident.qdim);
    let (mx, my) = directmat(direct, &ident.idx, &ident.idy)?;
    let (ex, ey) = total_effects_alg(&mx, &my, None, None)?;

    let mut vec_y = Array2::<f64>::zeros((n * n, q));
    vec_y.slice_mut(s![.., ..qy]).assign(&vecmat(&ident.idy));
    let mut vec_x = Array2::<f64>::zeros((n * m, q));
    vec_x.slice_mut(s![.., qy..]).assign(&vecmat(&ident.idx));

    let jac_y = kron(&ey.t(), &ey).dot(&vec_y);
    let jac_x = kron(&ex.t(), &ey).dot(&vec_y) + kron(&Array2::<f64>::eye(m), &ey).dot(&vec_x);

    let rows_y: Vec<usize> = support(&ident.edy).into_iter().map(|(i, j)| j * n + i).collect();
    let rows_x: Vec<usize> = support(&ident.edx).into_iter().map(|(i, j)| j * n + i).collect();
    let jac_y = jac_y.select(Axis(0), &rows_y);
    let jac_x = jac_x.select(Axis(0), &rows_x);
    Ok(ndarray::concatenate![Axis(0), jac_y, jac_x])
}

/// jacobian_num — central-difference Jacobian of `total_from_direct`.
///
/// # Errors
/// - `InferenceError::Effects` when an evaluation fails.
/// - `InferenceError::Optimization` when the finite-difference rows are
///   not finite.
pub fn jacobian_num(direct: &Array1<f64>, ident: &Identification) -> InferenceResult<Array2<f64>> {
    let effects = |d: &Array1<f64>| -> Result<Array1<f64>, OptError> {
        Ok(total_from_direct(d, &ident.idx, &ident.idy, &ident.edx, &ident.edy)?)
    };
    Ok(compute_jacobian(&effects, direct)?)
}

/// Compare two Jacobians elementwise with [`JACOBIAN_ATOL`] / [`JACOBIAN_RTOL`].
///
/// Shape disagreement counts as a mismatch with an infinite difference.
pub fn compare_jacobians(jac_num: &Array2<f64>, jac_alg: &Array2<f64>) -> JacobianCheck {
    if jac_num.dim() != jac_alg.dim() {
        return JacobianCheck { max_abs_diff: f64::INFINITY, atol: JACOBIAN_ATOL, allclose: false };
    }
    let mut max_abs_diff: f64 = 0.0;
    let mut allclose = true;
    for (a, b) in jac_num.iter().zip(jac_alg.iter()) {
        let diff = (a - b).abs();
        max_abs_diff = max_abs_diff.max(diff);
        allclose &= diff <= JACOBIAN_ATOL + JACOBIAN_RTOL * b.abs();
    }
    JacobianCheck { max_abs_diff, atol: JACOBIAN_ATOL, allclose }
}

/// total_effects_std — delta-method standard deviations of total effects.
///
/// Purpose
/// -------
/// Compute `vcm_effects = J·vcm_coeff·Jᵀ` with the algebraic Jacobian at
/// `direct_hat`, take square roots of its diagonal, and scatter them into
/// `(ex_std, ey_std)` through `(edx, edy)`. The algebraic Jacobian is
/// cross-checked against the numerical one.
///
/// Parameters
/// ----------
/// - `direct_hat`: `&Array1<f64>` estimated free coefficients.
/// - `vcm_coeff_hat`: `&Array2<f64>` their `qdim × qdim` covariance.
/// - `ident`: `&Identification`.
///
/// Returns
/// -------
/// `InferenceResult<EffectsStd>`; `ey_std` has a zero diagonal.
///
/// Errors
/// ------
/// - `InferenceError::CovarianceDimMismatch` if `vcm_coeff_hat` is not
///   `qdim × qdim`.
/// - Propagates Jacobian construction errors.
///
/// Notes
/// -----
/// - A Jacobian mismatch is reported through `jacobian_check` and a
///   `log::warn!` line; the algebraic Jacobian is used regardless.
pub fn total_effects_std(
    direct_hat: &Array1<f64>, vcm_coeff_hat: &Array2<f64>, ident: &Identification,
) -> InferenceResult<EffectsStd> {
    let q = ident.qdim;
    if vcm_coeff_hat.dim() != (q, q) {
        return Err(InferenceError::CovarianceDimMismatch {
            expected: q,
            found: vcm_coeff_hat.dim(),
        });
    }
    let jac_alg = jacobian_alg(direct_hat, ident)?;
    let jac_num = jacobian_num(direct_hat, ident)?;
    let jacobian_check = compare_jacobians(&jac_num, &jac_alg);
    if jacobian_check.allclose {
        log::debug!(
            "numeric and algebraic effects jacobians agree (max abs diff {:.3e})",
            jacobian_check.max_abs_diff
        );
    } else {
        log::warn!(
            "numeric and algebraic effects jacobians differ: max abs diff {:.3e} exceeds atol {:.0e}",
            jacobian_check.max_abs_diff,
            jacobian_check.atol
        );
    }

    let vcm_effects = jac_alg.dot(vcm_coeff_hat).dot(&jac_alg.t());
    let effects_std = std_from_variances(&vcm_effects)?;
    let (ex_std, mut ey_std) = directmat(&effects_std, &ident.edx, &ident.edy)?;
    ey_std.diag_mut().fill(0.0);
    Ok(EffectsStd { ex_std, ey_std, vcm_effects, jacobian_check })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of algebraic and numerical Jacobians on a 3-equation
    //   linear model.
    // - Known Jacobian entries on a 2-equation chain.
    // - The zero diagonal of `ey_std` and covariance shape validation.
    // - Mismatch reporting by `compare_jacobians`.
    // -------------------------------------------------------------------------

    /// `y1 ← x1`, `y2 ← y1, x2`, `y3 ← y1, y2, x1`.
    fn three_equation_ident() -> (Identification, Array1<f64>) {
        let idx = array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let idy = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
        let yvars = ["y1", "y2", "y3"];
        let ident = Identification::new(&idx, &idy, &yvars, "y3").expect("acyclic pattern");
        // idy support column-major: (1,0), (2,0), (2,1); idx: (0,0), (2,0), (1,1).
        let direct = array![0.7, -0.4, 1.3, 0.5, 0.2, -0.8];
        (ident, direct)
    }

    #[test]
    // Purpose
    // -------
    // Verify the Kronecker Jacobian agrees with central differences.
    //
    // Given
    // -----
    // - The three-equation model at a generic coefficient vector.
    //
    // Expect
    // ------
    // - Equal shapes and `allclose` at atol 1e-4.
    fn algebraic_jacobian_matches_numeric() {
        let (ident, direct) = three_equation_ident();

        let jac_alg = jacobian_alg(&direct, &ident).expect("algebraic jacobian");
        let jac_num = jacobian_num(&direct, &ident).expect("numeric jacobian");
        let check = compare_jacobians(&jac_num, &jac_alg);

        assert_eq!(jac_alg.dim(), (ident.effects_dim(), ident.qdim));
        assert!(check.allclose, "max abs diff {}", check.max_abs_diff);
    }

    #[test]
    // Purpose
    // -------
    // Pin individual Jacobian entries on the chain `x → y1 → y2`.
    //
    // Given
    // -----
    // - `mx = [[a], [0]]`, `my = [[0, 0], [b, 0]]` with `a = 2`, `b = 3`;
    //   free vector `[b, a]`; effects rows `[ey11, ey21, ey22, ex11, ex21]`.
    //
    // Expect
    // ------
    // - `∂ey21/∂b = 1`, `∂ex21/∂b = a`, `∂ex21/∂a = b`, `∂ex11/∂a = 1`, and
    //   zero rows for the diagonal of `ey`.
    fn chain_jacobian_entries() {
        let idx = array![[1.0], [0.0]];
        let idy = array![[0.0, 0.0], [1.0, 0.0]];
        let ident = Identification::new(&idx, &idy, &["y1", "y2"], "y2").expect("chain");
        let direct = array![3.0, 2.0];

        let jac = jacobian_alg(&direct, &ident).expect("algebraic jacobian");

        assert_eq!(jac.dim(), (5, 2));
        assert_eq!(jac.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(jac.row(1).to_vec(), vec![1.0, 0.0]);
        assert_eq!(jac.row(2).to_vec(), vec![0.0, 0.0]);
        assert_eq!(jac.row(3).to_vec(), vec![0.0, 1.0]);
        assert_eq!(jac.row(4).to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    // Purpose
    // -------
    // Check the delta-method output shape and the zero `ey_std` diagonal.
    //
    // Given
    // -----
    // - The three-equation model with `vcm = 0.01·I`.
    //
    // Expect
    // ------
    // - `ey_std` 3×3 with zero diagonal, `ex_std` 3×2, non-negative entries,
    //   zero entries wherever `edx`/`edy` vanish.
    fn total_effects_std_has_zero_ey_diagonal() {
        let (ident, direct) = three_equation_ident();
        let vcm = Array2::<f64>::eye(ident.qdim) * 0.01;

        let std = total_effects_std(&direct, &vcm, &ident).expect("delta method");

        assert_eq!(std.ey_std.dim(), (3, 3));
        assert_eq!(std.ex_std.dim(), (3, 2));
        for i in 0..3 {
            assert_eq!(std.ey_std[[i, i]], 0.0);
        }
        for ((pos, v), e) in std.ex_std.indexed_iter().zip(ident.edx.iter()) {
            assert!(*v >= 0.0, "negative std at {pos:?}");
            if *e == 0.0 {
                assert_eq!(*v, 0.0);
            }
        }
        assert!(std.jacobian_check.allclose);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a covariance of the wrong size is rejected.
    //
    // Given
    // -----
    // - `qdim = 6` and a 2×2 covariance.
    //
    // Expect
    // ------
    // - `InferenceError::CovarianceDimMismatch { expected: 6, .. }`.
    fn total_effects_std_rejects_wrong_covariance() {
        let (ident, direct) = three_equation_ident();

        let err = total_effects_std(&direct, &Array2::eye(2), &ident).expect_err("bad vcm");

        assert!(matches!(err, InferenceError::CovarianceDimMismatch { expected: 6, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure Jacobians of different shapes are reported as a mismatch.
    //
    // Given
    // -----
    // - A 2×2 and a 2×3 zero matrix.
    //
    // Expect
    // ------
    // - `allclose == false` and an infinite `max_abs_diff`.
    fn compare_jacobians_flags_shape_mismatch() {
        let check = compare_jacobians(&Array2::zeros((2, 2)), &Array2::zeros((2, 3)));

        assert!(!check.allclose);
        assert!(check.max_abs_diff.is_infinite());
        assert_eq!(check.atol, JACOBIAN_ATOL);
    }

    #[test]
    // Purpose
    // -------
    // Verify one entry off by more than the tolerance flips the check and
    // is measured exactly, while a sub-tolerance difference does not.
    //
    // Given
    // -----
    // - The three-equation algebraic Jacobian, once with entry (1, 0)
    //   shifted by 5e-4 and once with entry (0, 0) shifted by 5e-5.
    //
    // Expect
    // ------
    // - Shifted by 5e-4: `allclose == false`, `max_abs_diff ≈ 5e-4`.
    // - Shifted by 5e-5: `allclose == true`.
    fn compare_jacobians_flags_perturbed_entry() {
        let (ident, direct) = three_equation_ident();
        let jac_alg = jacobian_alg(&direct, &ident).expect("algebraic jacobian");
        let mut far = jac_alg.clone();
        far[[1, 0]] += 5e-4;
        let mut near = jac_alg.clone();
        near[[0, 0]] += 5e-5;

        let far_check = compare_jacobians(&far, &jac_alg);
        let near_check = compare_jacobians(&near, &jac_alg);

        assert!(!far_check.allclose);
        assert!((far_check.max_abs_diff - 5e-4).abs() < 1e-12);
        assert!(near_check.allclose);
    }
}

//! effects::total — total effects from direct effects.
//!
//! Solves the linear fixed point `y = my·y + mx·x` for its reduced form
//! `y = ey·mx·x` with `ey = (I − my)⁻¹`, `ex = ey·mx`. Optional identification
//! masks `(edx, edy)` set structurally-zero total effects to exactly zero
//! and the self-total-effects on the diagonal of `ey` to exactly one.
use crate::{
    effects::errors::{EffectsError, EffectsResult},
    optimization::numerical_stability::linalg::invert,
};
use ndarray::Array2;

/// total_effects_alg — algebraic total effects.
///
/// Purpose
/// -------
/// Compute `ey = (I − my)⁻¹` and `ex = ey·mx`, then apply the total-effects
/// identification masks when supplied.
///
/// Parameters
/// ----------
/// - `mx`: `&Array2<f64>` (`n×m`) direct effects of x on y.
/// - `my`: `&Array2<f64>` (`n×n`) direct effects of y on y; zero diagonal.
/// - `edx`: `Option<&Array2<f64>>` (`n×m`) mask for `ex`.
/// - `edy`: `Option<&Array2<f64>>` (`n×n`) mask for `ey`.
///
/// Returns
/// -------
/// `EffectsResult<(Array2<f64>, Array2<f64>)>` as `(ex, ey)`.
///
/// Errors
/// ------
/// - `EffectsError::DimensionMismatch` if `my` is not `n×n`, or a mask does
///   not match its target.
/// - `EffectsError::NotNormalized` for the first nonzero diagonal entry of
///   `my`, regardless of `mx`.
/// - `EffectsError::SingularSystem` if `I − my` is not invertible.
///
/// Notes
/// -----
/// - Masking with `edy` also forces `diag(ey) = 1`, removing round-off left
///   by the inversion.
pub fn total_effects_alg(
    mx: &Array2<f64>, my: &Array2<f64>, edx: Option<&Array2<f64>>, edy: Option<&Array2<f64>>,
) -> EffectsResult<(Array2<f64>, Array2<f64>)> {
    let ndim = mx.nrows();
    check_shape("my", my, (ndim, ndim))?;
    for (index, &value) in my.diag().iter().enumerate() {
        if value != 0.0 {
            return Err(EffectsError::NotNormalized { index, value });
        }
    }

    let eye = Array2::<f64>::eye(ndim);
    let mut ey = invert(&(&eye - my)).ok_or(EffectsError::SingularSystem { dim: ndim })?;
    let mut ex = ey.dot(mx);

    if let Some(edx) = edx {
        check_shape("edx", edx, ex.dim())?;
        ex.zip_mut_with(edx, |e, &mask| {
            if mask == 0.0 {
                *e = 0.0;
            }
        });
    }
    if let Some(edy) = edy {
        check_shape("edy", edy, ey.dim())?;
        ey.zip_mut_with(edy, |e, &mask| {
            if mask == 0.0 {
                *e = 0.0;
            }
        });
        ey.diag_mut().fill(1.0);
    }
    Ok((ex, ey))
}

pub(crate) fn check_shape(
    what: &'static str, mat: &Array2<f64>, expected: (usize, usize),
) -> EffectsResult<()> {
    if mat.dim() != expected {
        return Err(EffectsError::DimensionMismatch { what, expected, found: mat.dim() });
    }
    Ok(())
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
    // - The inverse identity `ey·(I − my) = I` and unit diagonal after masking.
    // - Normalization and singularity errors.
    // - Exact zeroing of unidentified total effects.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify `ey` inverts `I − my` and that masking pins the diagonal to one.
    //
    // Given
    // -----
    // - A 3-variable chain `y1 → y2 → y3` plus a direct `y1 → y3` edge.
    // - A full mask for `edy`.
    //
    // Expect
    // ------
    // - `ey·(I − my) ≈ I` and `diag(ey) == 1` exactly.
    fn total_effects_invert_structural_form() {
        let my = array![[0.0, 0.0, 0.0], [0.7, 0.0, 0.0], [0.2, -0.4, 0.0]];
        let mx = array![[1.0], [0.0], [0.5]];
        let edy = Array2::<f64>::ones((3, 3));

        let (ex, ey) = total_effects_alg(&mx, &my, None, Some(&edy)).expect("regular system");

        let prod = ey.dot(&(Array2::<f64>::eye(3) - &my));
        for ((i, j), v) in prod.indexed_iter() {
            let target = if i == j { 1.0 } else { 0.0 };
            assert!((v - target).abs() < 1e-12, "entry ({i}, {j}) = {v}");
        }
        assert!(ey.diag().iter().all(|&d| d == 1.0));
        // y3 = 0.2 y1 - 0.4 y2 + 0.5 x, y2 = 0.7 y1, y1 = x
        assert_abs_diff_eq!(ex[[2, 0]], (0.2 - 0.4 * 0.7 + 0.5), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure any nonzero diagonal entry in `my` is rejected.
    //
    // Given
    // -----
    // - `my` with a self-loop at index 1; `mx` arbitrary.
    //
    // Expect
    // ------
    // - `EffectsError::NotNormalized { index: 1, .. }`.
    fn total_effects_reject_self_loop() {
        let my = array![[0.0, 0.0], [0.3, 1e-9]];
        let mx = array![[1.0], [1.0]];

        let err = total_effects_alg(&mx, &my, None, None).expect_err("self loop");

        assert_eq!(err, EffectsError::NotNormalized { index: 1, value: 1e-9 });
    }

    #[test]
    // Purpose
    // -------
    // Ensure a singular `I − my` is reported instead of producing infinities.
    //
    // Given
    // -----
    // - A 2-cycle with unit gains, so `I − my` has determinant zero.
    //
    // Expect
    // ------
    // - `EffectsError::SingularSystem { dim: 2 }`.
    fn total_effects_report_singular_system() {
        let my = array![[0.0, 1.0], [1.0, 0.0]];
        let mx = array![[1.0], [0.0]];

        let err = total_effects_alg(&mx, &my, None, None).expect_err("singular");

        assert_eq!(err, EffectsError::SingularSystem { dim: 2 });
    }

    #[test]
    // Purpose
    // -------
    // Check masks zero unidentified total effects exactly.
    //
    // Given
    // -----
    // - `edx` masking out entry (0, 1).
    //
    // Expect
    // ------
    // - `ex[0, 1] == 0` while identified entries keep their values.
    fn total_effects_apply_masks() {
        let my = array![[0.0, 0.0], [0.5, 0.0]];
        let mx = array![[1.0, 1e-17], [0.0, 2.0]];
        let edx = array![[1.0, 0.0], [1.0, 1.0]];

        let (ex, _) = total_effects_alg(&mx, &my, Some(&edx), None).expect("regular system");

        assert_eq!(ex[[0, 1]], 0.0);
        assert_abs_diff_eq!(ex[[1, 0]], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(ex[[1, 1]], 2.0, epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a non-square `my` is a dimension error.
    //
    // Given
    // -----
    // - `mx` with two rows and a 2×3 `my`.
    //
    // Expect
    // ------
    // - `EffectsError::DimensionMismatch` naming `my`.
    fn total_effects_reject_bad_shapes() {
        let mx = Array2::<f64>::zeros((2, 1));
        let my = Array2::<f64>::zeros((2, 3));

        let err = total_effects_alg(&mx, &my, None, None).expect_err("bad shape");

        assert!(matches!(err, EffectsError::DimensionMismatch { what: "my", .. }));
    }
}

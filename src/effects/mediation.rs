//! effects::mediation — effects on a fixed final variable routed through
//! each endogenous variable.
//!
//! Purpose
//! -------
//! Decompose the total effect on the designated final variable `y_j` into
//! the share mediated by each endogenous variable's direct dependence on
//! the exogenous and endogenous inputs, and translate total-effect standard
//! deviations into standard deviations of those mediation shares.
//!
//! Key behaviors
//! -------------
//! - [`compute_mediation_effects`]: `exj = ex[j, :]`, `eyj = ey[j, :]`,
//!   `eyx[i, k] = eyj[i]·mx[i, k]`, `eyy[i, k] = eyj[i]·my[i, k]`.
//! - [`compute_mediation_std`]: column-normalize `eyx`/`eyy` and scale by
//!   the final variable's total-effect standard deviations.
//!
//! Invariants & assumptions
//! ------------------------
//! - `final_var` must be present in `yvars`; the index lookup is the only
//!   fallible step.
//! - A zero column sum is replaced by one, so that column reports a zero
//!   mediation standard deviation instead of `NaN`.
use crate::effects::errors::{EffectsError, EffectsResult};
use ndarray::{Array1, Array2, Axis};

/// Mediation effects on the final variable.
#[derive(Debug, Clone, PartialEq)]
pub struct MediationEffects {
    /// Total effects of each x on the final variable (`m`).
    pub exj: Array1<f64>,
    /// Total effects of each y on the final variable (`n`).
    pub eyj: Array1<f64>,
    /// Mediation through x-dependence (`n×m`).
    pub eyx: Array2<f64>,
    /// Mediation through y-dependence (`n×n`).
    pub eyy: Array2<f64>,
}

/// Standard deviations of [`MediationEffects`].
#[derive(Debug, Clone, PartialEq)]
pub struct MediationStd {
    pub exj_std: Array1<f64>,
    pub eyj_std: Array1<f64>,
    pub eyx_std: Array2<f64>,
    pub eyy_std: Array2<f64>,
}

/// Position of `final_var` within `yvars`.
pub fn final_index<S: AsRef<str>>(yvars: &[S], final_var: &str) -> EffectsResult<usize> {
    yvars
        .iter()
        .position(|v| v.as_ref() == final_var)
        .ok_or_else(|| EffectsError::UnknownVariable { name: final_var.to_string() })
}

/// compute_mediation_effects — mediation matrices for the final variable.
///
/// Parameters
/// ----------
/// - `mx`, `my`: direct effects (`n×m`, `n×n`).
/// - `ex`, `ey`: total effects (`n×m`, `n×n`).
/// - `yvars`: endogenous variable names (`n`).
/// - `final_var`: name of the final variable.
///
/// Returns
/// -------
/// `EffectsResult<MediationEffects>`.
///
/// Errors
/// ------
/// - `EffectsError::UnknownVariable` if `final_var` is not in `yvars`.
/// - `EffectsError::DimensionMismatch` if `ex`/`ey` rows differ from `mx`.
pub fn compute_mediation_effects<S: AsRef<str>>(
    mx: &Array2<f64>, my: &Array2<f64>, ex: &Array2<f64>, ey: &Array2<f64>, yvars: &[S],
    final_var: &str,
) -> EffectsResult<MediationEffects> {
    let jvar = final_index(yvars, final_var)?;
    crate::effects::total::check_shape("ex", ex, mx.dim())?;
    crate::effects::total::check_shape("ey", ey, my.dim())?;
    if jvar >= ex.nrows() {
        return Err(EffectsError::DimensionMismatch {
            what: "yvars",
            expected: (ex.nrows(), 1),
            found: (yvars.len(), 1),
        });
    }

    let exj = ex.row(jvar).to_owned();
    let eyj = ey.row(jvar).to_owned();
    let eyj_col = eyj.view().insert_axis(Axis(1));
    let eyx = &eyj_col * mx;
    let eyy = &eyj_col * my;
    Ok(MediationEffects { exj, eyj, eyx, eyy })
}

/// compute_mediation_std — standard deviations of mediation effects.
///
/// Purpose
/// -------
/// Distribute the final variable's total-effect standard deviation
/// `exj_std[k]` (resp. `eyj_std[k]`) over column `k` of the mediation
/// matrix in proportion to each row's share of the column sum:
/// `eyx_std[i, k] = exj_std[k]·eyx[i, k] / Σ_i eyx[i, k]`.
///
/// Parameters
/// ----------
/// - `ex_std`, `ey_std`: total-effect standard deviations (`n×m`, `n×n`).
/// - `eyx`, `eyy`: mediation matrices from [`compute_mediation_effects`].
/// - `yvars`, `final_var`: as for [`compute_mediation_effects`].
///
/// Errors
/// ------
/// - `EffectsError::UnknownVariable` if `final_var` is not in `yvars`.
pub fn compute_mediation_std<S: AsRef<str>>(
    ex_std: &Array2<f64>, ey_std: &Array2<f64>, eyx: &Array2<f64>, eyy: &Array2<f64>,
    yvars: &[S], final_var: &str,
) -> EffectsResult<MediationStd> {
    let jvar = final_index(yvars, final_var)?;
    crate::effects::total::check_shape("eyx", eyx, ex_std.dim())?;
    crate::effects::total::check_shape("eyy", eyy, ey_std.dim())?;

    let exj_std = ex_std.row(jvar).to_owned();
    let eyj_std = ey_std.row(jvar).to_owned();
    let eyx_std = &column_normalized(eyx) * &exj_std;
    let eyy_std = &column_normalized(eyy) * &eyj_std;
    Ok(MediationStd { exj_std, eyj_std, eyx_std, eyy_std })
}

fn column_normalized(mat: &Array2<f64>) -> Array2<f64> {
    let colsum = mat.sum_axis(Axis(0)).mapv(|s| if s == 0.0 { 1.0 } else { s });
    mat / &colsum
}

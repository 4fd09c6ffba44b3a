//! model::estimate — estimated effects and their standard deviations.
//!
//! Purpose
//! -------
//! Run the estimation pipeline on a prepared [`ModelSetup`]: fit the direct
//! effects by Adam on the centered data, derive total and mediation effects,
//! and attach standard deviations from the SSE Hessian and the delta method.
//!
//! Key behaviors
//! -------------
//! - The fit starts from the theoretical direct effects at the exogenous
//!   means and honours `spec.alpha` and `spec.estimator`.
//! - `vcm_coeff_hat = 2·σ̂²·H⁺` with `nobs = tau·p`.
//! - Total-effect standard deviations come from the algebraic Jacobian; the
//!   numeric cross-check is reported in `jacobian_check`.
//!
//! Downstream usage
//! ----------------
//! - Compare estimates with theoretical values through
//!   [`relative_accuracy`].
use crate::{
    effects::{
        mediation::{compute_mediation_effects, compute_mediation_std},
        total::total_effects_alg,
    },
    inference::{
        covariance::{coefficient_covariance, compute_direct_std},
        delta::{JacobianCheck, total_effects_std},
    },
    model::{data::ObservedData, errors::ModelResult, setup::ModelSetup, spec::ModelSpec},
    optimization::ad_estimator::{StructuralNet, estimate_snn, sse_hess},
};
use ndarray::{Array1, Array2};

pub use crate::optimization::numerical_stability::linalg::relative_accuracy;

/// Estimated effects with standard deviations.
///
/// Fields
/// ------
/// - `mx_hat`, `my_hat`, `direct_hat`: fitted direct effects, as matrices
///   and as the free-coefficient vector.
/// - `ex_hat`, `ey_hat`: total effects.
/// - `exj_hat`, `eyj_hat`, `eyx_hat`, `eyy_hat`: mediation effects on the
///   final variable.
/// - `sse_hat`, `epochs`: objective at the final iterate and epochs run.
/// - `hessian`, `vcm_coeff_hat`: SSE Hessian and coefficient covariance
///   over the free coefficients.
/// - `*_std`: standard deviations matching each estimate.
/// - `vcm_effects`: covariance of the free total effects.
/// - `jacobian_check`: algebraic vs numeric Jacobian agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimates {
    pub mx_hat: Array2<f64>,
    pub my_hat: Array2<f64>,
    pub direct_hat: Array1<f64>,
    pub ex_hat: Array2<f64>,
    pub ey_hat: Array2<f64>,
    pub exj_hat: Array1<f64>,
    pub eyj_hat: Array1<f64>,
    pub eyx_hat: Array2<f64>,
    pub eyy_hat: Array2<f64>,
    pub sse_hat: f64,
    pub epochs: u64,
    pub hessian: Array2<f64>,
    pub vcm_coeff_hat: Array2<f64>,
    pub mx_std: Array2<f64>,
    pub my_std: Array2<f64>,
    pub ex_std: Array2<f64>,
    pub ey_std: Array2<f64>,
    pub exj_std: Array1<f64>,
    pub eyj_std: Array1<f64>,
    pub eyx_std: Array2<f64>,
    pub eyy_std: Array2<f64>,
    pub vcm_effects: Array2<f64>,
    pub jacobian_check: JacobianCheck,
}

/// estimate_effects — fit direct effects and derive every estimate.
///
/// Parameters
/// ----------
/// - `spec`: `&ModelSpec` variables, Tikhonov weight, estimator options.
/// - `setup`: `&ModelSetup` from [`crate::model::setup::create_model`].
/// - `data`: `&ObservedData` the setup was built from.
///
/// Returns
/// -------
/// `ModelResult<Estimates>`.
///
/// Errors
/// ------
/// - `ModelError::Optimization` for fit failures, including
///   `MaxEpochsReached` and `SupportLeak`.
/// - `ModelError::Inference` if the residual degrees of freedom are not
///   positive.
/// - `ModelError::Effects` if the fitted system is singular.
pub fn estimate_effects(
    spec: &ModelSpec, setup: &ModelSetup, data: &ObservedData,
) -> ModelResult<Estimates> {
    let ident = &setup.ident;
    let net = StructuralNet::new(
        ident.idx.clone(),
        ident.idy.clone(),
        data.xcdat.clone(),
        data.ymcdat.clone(),
        setup.fym.clone(),
        data.selwei.clone(),
        spec.alpha,
    )?;
    let fit = estimate_snn(&net, &setup.theo.mx, &setup.theo.my, &spec.estimator)?;
    log::info!("direct effects fitted after {} epochs, sse {:.6}", fit.epochs, fit.sse_hat);

    let (ex_hat, ey_hat) =
        total_effects_alg(&fit.mx_hat, &fit.my_hat, Some(&ident.edx), Some(&ident.edy))?;
    let med = compute_mediation_effects(
        &fit.mx_hat,
        &fit.my_hat,
        &ex_hat,
        &ey_hat,
        spec.yvars.as_slice(),
        &spec.final_var,
    )?;

    let hessian = sse_hess(&net, &fit.mx_hat, &fit.my_hat)?;
    let vcm_coeff_hat = coefficient_covariance(&hessian, fit.sse_hat, data.nobs(), ident.qdim)?;
    let (mx_std, my_std) = compute_direct_std(&vcm_coeff_hat, &ident.idx, &ident.idy)?;

    let direct_hat = fit.direct_hat;
    let effects_std = total_effects_std(&direct_hat, &vcm_coeff_hat, ident)?;
    let med_std = compute_mediation_std(
        &effects_std.ex_std,
        &effects_std.ey_std,
        &med.eyx,
        &med.eyy,
        spec.yvars.as_slice(),
        &spec.final_var,
    )?;
    log::info!("standard deviations of {} coefficients computed", ident.qdim);

    Ok(Estimates {
        mx_hat: fit.mx_hat,
        my_hat: fit.my_hat,
        direct_hat,
        ex_hat,
        ey_hat,
        exj_hat: med.exj,
        eyj_hat: med.eyj,
        eyx_hat: med.eyx,
        eyy_hat: med.eyy,
        sse_hat: fit.sse_hat,
        epochs: fit.epochs,
        hessian,
        vcm_coeff_hat,
        mx_std,
        my_std,
        ex_std: effects_std.ex_std,
        ey_std: effects_std.ey_std,
        exj_std: med_std.exj_std,
        eyj_std: med_std.eyj_std,
        eyx_std: med_std.eyx_std,
        eyy_std: med_std.eyy_std,
        vcm_effects: effects_std.vcm_effects,
        jacobian_check: effects_std.jacobian_check,
    })
}

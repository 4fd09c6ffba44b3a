//! model::setup — identification and theoretical effects of a specified model.
//!
//! Purpose
//! -------
//! Combine a [`ModelSpec`], an [`Adjacency`], and [`ObservedData`] into a
//! [`ModelSetup`]: the identification bundle, theoretical direct, total and
//! mediation effects at the exogenous means and for individual
//! observations, and location summaries of the model's predictions.
//!
//! Key behaviors
//! -------------
//! - Theoretical effects at `xmean` use the direct effects of the equations
//!   at `(xmean, y(xmean))` and the masked total-effects algebra.
//! - Individual effects are computed for the first `show_nr_indiv`
//!   observations.
//! - `yhat` is the noiseless model prediction over the sample; `ydet` is the
//!   prediction at the exogenous means.
//!
//! Downstream usage
//! ----------------
//! - `model::estimate` starts the structural fit from
//!   `ModelSetup::theo.mx` / `.my` and reuses `ident`.
use crate::{
    effects::{
        identification::Identification,
        mediation::compute_mediation_effects,
        total::total_effects_alg,
        vectorize::directvec_alg,
    },
    model::{
        adjacency::Adjacency,
        data::{ObservedData, row_means, row_medians},
        equations::DifferentiableModel,
        errors::{ModelError, ModelResult},
        spec::ModelSpec,
    },
};
use ndarray::{Array1, Array2, Axis};

/// Direct, total, and mediation effects at one exogenous point.
#[derive(Debug, Clone, PartialEq)]
pub struct TheoreticalEffects {
    pub mx: Array2<f64>,
    pub my: Array2<f64>,
    pub ex: Array2<f64>,
    pub ey: Array2<f64>,
    pub exj: Array1<f64>,
    pub eyj: Array1<f64>,
    pub eyx: Array2<f64>,
    pub eyy: Array2<f64>,
    /// Free coefficients in `directvec_alg` order.
    pub direct: Array1<f64>,
}

/// Results of model construction.
///
/// Fields
/// ------
/// - `ident`: identification bundle.
/// - `theo`: theoretical effects at `xmean`.
/// - `indiv`: theoretical effects of the first `show_nr_indiv`
///   observations.
/// - `yhat` (`n×tau`): model prediction without disturbances.
/// - `ymean`, `ymedian`: row means and medians of `yhat`.
/// - `xmedian`: row medians of `xdat`.
/// - `ydet`: prediction at `xmean`.
/// - `fym` (`p×n`), `selvec` (`n`): manifest selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSetup {
    pub ident: Identification,
    pub theo: TheoreticalEffects,
    pub indiv: Vec<TheoreticalEffects>,
    pub yhat: Array2<f64>,
    pub ymean: Array1<f64>,
    pub ymedian: Array1<f64>,
    pub xmedian: Array1<f64>,
    pub ydet: Array1<f64>,
    pub fym: Array2<f64>,
    pub selvec: Array1<f64>,
}

/// create_model — identify a model and compute its theoretical effects.
///
/// Parameters
/// ----------
/// - `spec`: `&ModelSpec` variables and settings.
/// - `adjacency`: `&Adjacency<M>` identified equation system.
/// - `data`: `&ObservedData` validated observations.
///
/// Returns
/// -------
/// `ModelResult<ModelSetup>`.
///
/// Errors
/// ------
/// - `ModelError::EquationDimMismatch` if the equations do not match the
///   variable lists.
/// - `ModelError::InvalidShowNrIndiv` if more individual effects are
///   requested than observations exist.
/// - Propagates equation, effects, and derivative errors.
pub fn create_model<M: DifferentiableModel>(
    spec: &ModelSpec, adjacency: &Adjacency<M>, data: &ObservedData,
) -> ModelResult<ModelSetup> {
    if adjacency.ndim() != spec.ndim() {
        return Err(ModelError::EquationDimMismatch {
            which: "equations",
            expected: spec.ndim(),
            found: adjacency.ndim(),
        });
    }
    if adjacency.mdim() != spec.mdim() {
        return Err(ModelError::EquationDimMismatch {
            which: "exogenous variables",
            expected: spec.mdim(),
            found: adjacency.mdim(),
        });
    }
    if spec.show_nr_indiv > data.tau() {
        return Err(ModelError::InvalidShowNrIndiv {
            requested: spec.show_nr_indiv,
            available: data.tau(),
        });
    }

    let ident =
        Identification::new(adjacency.idx(), adjacency.idy(), spec.yvars.as_slice(), &spec.final_var)?;
    log::info!(
        "{} yvars (equations) and {} xvars. {} observations and {} coefficients.",
        spec.ndim(),
        spec.mdim(),
        data.tau(),
        ident.qdim
    );

    let yhat = adjacency.model(&data.xdat, 0.0, 0)?;
    let ydet = adjacency.solve(&data.xmean, 0.0, 0)?;
    let theo = theoretical_effects(spec, adjacency, &ident, &data.xmean)?;
    let indiv = data
        .xdat
        .axis_iter(Axis(1))
        .take(spec.show_nr_indiv)
        .map(|x| theoretical_effects(spec, adjacency, &ident, &x.to_owned()))
        .collect::<ModelResult<Vec<_>>>()?;

    Ok(ModelSetup {
        ymean: row_means(&yhat),
        ymedian: row_medians(&yhat),
        xmedian: data.xmedian.clone(),
        ident,
        theo,
        indiv,
        yhat,
        ydet,
        fym: spec.fym(),
        selvec: spec.selvec(),
    })
}

/// Theoretical effects at the exogenous point `x`.
///
/// # Errors
/// Propagates equation and effects-algebra errors.
pub fn theoretical_effects<M: DifferentiableModel>(
    spec: &ModelSpec, adjacency: &Adjacency<M>, ident: &Identification, x: &Array1<f64>,
) -> ModelResult<TheoreticalEffects> {
    let (mx, my) = adjacency.direct_effects(x)?;
    let (ex, ey) = total_effects_alg(&mx, &my, Some(&ident.edx), Some(&ident.edy))?;
    let med =
        compute_mediation_effects(&mx, &my, &ex, &ey, spec.yvars.as_slice(), &spec.final_var)?;
    let direct = directvec_alg(&mx, &my, &ident.idx, &ident.idy)?;
    Ok(TheoreticalEffects {
        mx,
        my,
        ex,
        ey,
        exj: med.exj,
        eyj: med.eyj,
        eyx: med.eyx,
        eyy: med.eyy,
        direct,
    })
}

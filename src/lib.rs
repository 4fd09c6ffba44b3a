//! rust_causal — total and mediation effects of structural-equation models,
//! with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes effect computation and estimation to Python via the
//! `_rust_causal` extension module. A structural model `y = f(x, y)` over
//! exogenous `x` and endogenous `y` is analysed through its direct effects
//! `(mx, my)`, its total effects `(ex, ey)`, and the mediation of total
//! effects on one designated final variable; estimated effects come with
//! delta-method standard deviations.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules as the public crate surface:
//!   - `effects`: identification, vectorization, total and mediation
//!     effects.
//!   - `model`: specification, equations, data, setup, estimation, bias.
//!   - `optimization`: Adam estimator, argmin minimizers, linear algebra.
//!   - `inference`: coefficient covariance and the delta method.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_causal` Python extension, with submodules `effects` and
//!   `models`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this
//!   file performs only FFI glue, input conversion, and error mapping.
//! - Python callers pass matrices as variables × observations, matching
//!   the Rust layout.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_causal.<submodule>` and are
//!   wrapped by thin pure-Python facades in the `rust_causal` package.
//! - Errors from core Rust code are converted to `ValueError` at the PyO3
//!   boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends directly on the inner modules (usually via
//!   `model::prelude`) and can ignore the items behind `python-bindings`.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules
//!   and by the pipeline tests under `tests/`.

pub mod effects;
pub mod inference;
pub mod model;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    effects::total::total_effects_alg,
    model::{
        Adjacency, Estimates, LinearEquations, ModelSetup, ModelSpec, ObservedData,
        create_model, estimate_effects, optimize_bias,
    },
    utils::{
        build_linear_model, extract_f64_matrix, extract_minimizer_opts, extract_optional_matrix,
        matrix_rows,
    },
};

/// TotalEffects — Python-facing total effects of given direct effects.
///
/// Purpose
/// -------
/// Compute `ey = (I − my)⁻¹` and `ex = ey·mx`, optionally masked by
/// `(edx, edy)`, and expose the results as nested lists.
///
/// Parameters
/// ----------
/// Constructed from Python via `TotalEffects(mx, my, edx=None, edy=None)`:
/// - `mx` (`n×m`), `my` (`n×n`): direct effects; `diag(my)` must be zero.
/// - `edx`, `edy`: optional binary masks of the same shapes.
///
/// Errors
/// ------
/// - `ValueError` for a nonzero diagonal of `my`, a singular `I − my`, or
///   inconsistent shapes.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_causal.effects")]
pub struct TotalEffects {
    ex: Array2<f64>,
    ey: Array2<f64>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TotalEffects {
    #[new]
    #[pyo3(signature = (mx, my, edx = None, edy = None))]
    pub fn new<'py>(
        mx: &Bound<'py, PyAny>, my: &Bound<'py, PyAny>, edx: Option<&Bound<'py, PyAny>>,
        edy: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<TotalEffects> {
        let mx = extract_f64_matrix(mx)?;
        let my = extract_f64_matrix(my)?;
        let edx = extract_optional_matrix(edx)?;
        let edy = extract_optional_matrix(edy)?;
        let (ex, ey) = total_effects_alg(&mx, &my, edx.as_ref(), edy.as_ref())?;
        Ok(TotalEffects { ex, ey })
    }

    /// Total effects of the exogenous variables (`n×m`).
    #[getter]
    pub fn ex(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.ex)
    }

    /// Total effects of the endogenous variables (`n×n`), unit diagonal.
    #[getter]
    pub fn ey(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.ey)
    }
}

/// LinearModel — Python-facing linear structural model with data.
///
/// Purpose
/// -------
/// Build a [`ModelSpec`], an [`Adjacency`] over [`LinearEquations`], and
/// [`ObservedData`], compute the theoretical effects, and run estimation or
/// bias tests on request.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `LinearModel(xvars, yvars, mx, my, xdat, ymdat, ymvars=None,
/// final_var=None, alpha=0.0, show_nr_indiv=0, max_epochs=None)`:
/// - `xvars`, `yvars`: variable names; `ymvars` defaults to `yvars`,
///   `final_var` to the last endogenous variable.
/// - `mx`, `my`: theoretical direct effects; their nonzero pattern is the
///   identification.
/// - `xdat` (`m×tau`), `ymdat` (`p×tau`): observations.
///
/// Errors
/// ------
/// - `ValueError` for any specification, equation, or data error.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_causal.models")]
pub struct LinearModel {
    spec: ModelSpec,
    adjacency: Adjacency<LinearEquations>,
    data: ObservedData,
    setup: ModelSetup,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl LinearModel {
    #[new]
    #[pyo3(signature = (
        xvars, yvars, mx, my, xdat, ymdat, ymvars = None, final_var = None, alpha = 0.0,
        show_nr_indiv = 0, max_epochs = None
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        xvars: Vec<String>, yvars: Vec<String>, mx: &Bound<'py, PyAny>, my: &Bound<'py, PyAny>,
        xdat: &Bound<'py, PyAny>, ymdat: &Bound<'py, PyAny>, ymvars: Option<Vec<String>>,
        final_var: Option<&str>, alpha: f64, show_nr_indiv: usize, max_epochs: Option<usize>,
    ) -> PyResult<LinearModel> {
        let (spec, adjacency) = build_linear_model(
            xvars,
            yvars,
            ymvars,
            final_var,
            extract_f64_matrix(mx)?,
            extract_f64_matrix(my)?,
            alpha,
            show_nr_indiv,
            max_epochs,
        )?;
        let data = ObservedData::new(extract_f64_matrix(xdat)?, extract_f64_matrix(ymdat)?, &spec)?;
        let setup = create_model(&spec, &adjacency, &data)?;
        Ok(LinearModel { spec, adjacency, data, setup })
    }

    /// Fit direct effects and return estimates with standard deviations.
    pub fn estimate(&self) -> PyResult<EffectsEstimates> {
        let inner = estimate_effects(&self.spec, &self.setup, &self.data)?;
        Ok(EffectsEstimates { inner })
    }

    /// Estimate the additive bias of equation `bias_ind`.
    ///
    /// Returns `(bias, hessian, sse)`.
    #[pyo3(signature = (bias_ind, method = None, tol_grad = None, tol_cost = None, max_iter = None))]
    pub fn bias(
        &self, bias_ind: usize, method: Option<&str>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> PyResult<(f64, f64, f64)> {
        let opts = match (method, tol_grad, tol_cost, max_iter) {
            (None, None, None, None) => Default::default(),
            _ => extract_minimizer_opts(method, tol_grad, tol_cost, max_iter)?,
        };
        let est = optimize_bias(&self.spec, &self.adjacency, &self.data, bias_ind, &opts)?;
        Ok((est.bias, est.hessian, est.sse))
    }

    /// Theoretical total effects of `x` at the exogenous means.
    #[getter]
    pub fn ex_theo(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.setup.theo.ex)
    }

    /// Theoretical total effects of `y` at the exogenous means.
    #[getter]
    pub fn ey_theo(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.setup.theo.ey)
    }

    /// Theoretical total effects of `x` on the final variable.
    #[getter]
    pub fn exj_theo(&self) -> Vec<f64> {
        self.setup.theo.exj.to_vec()
    }

    /// Model prediction at the exogenous means.
    #[getter]
    pub fn ydet(&self) -> Vec<f64> {
        self.setup.ydet.to_vec()
    }

    /// Number of free coefficients.
    #[getter]
    pub fn qdim(&self) -> usize {
        self.setup.ident.qdim
    }
}

/// EffectsEstimates — Python-facing view of [`Estimates`].
///
/// Matrices are returned as nested lists (rows first); `jacobian_allclose`
/// reports whether the algebraic and numeric Jacobians of the total effects
/// agreed.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_causal.models")]
pub struct EffectsEstimates {
    inner: Estimates,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl EffectsEstimates {
    #[getter]
    pub fn mx_hat(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.mx_hat)
    }

    #[getter]
    pub fn my_hat(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.my_hat)
    }

    #[getter]
    pub fn ex_hat(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.ex_hat)
    }

    #[getter]
    pub fn ey_hat(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.ey_hat)
    }

    #[getter]
    pub fn mx_std(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.mx_std)
    }

    #[getter]
    pub fn my_std(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.my_std)
    }

    #[getter]
    pub fn ex_std(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.ex_std)
    }

    #[getter]
    pub fn ey_std(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.inner.ey_std)
    }

    #[getter]
    pub fn exj_hat(&self) -> Vec<f64> {
        self.inner.exj_hat.to_vec()
    }

    #[getter]
    pub fn exj_std(&self) -> Vec<f64> {
        self.inner.exj_std.to_vec()
    }

    #[getter]
    pub fn sse_hat(&self) -> f64 {
        self.inner.sse_hat
    }

    #[getter]
    pub fn epochs(&self) -> u64 {
        self.inner.epochs
    }

    #[getter]
    pub fn jacobian_allclose(&self) -> bool {
        self.inner.jacobian_check.allclose
    }

    #[getter]
    pub fn jacobian_max_abs_diff(&self) -> f64 {
        self.inner.jacobian_check.max_abs_diff
    }
}

/// _rust_causal — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_causal` Python module and register its submodules used
/// by the public `rust_causal` package.
///
/// Key behaviors
/// -------------
/// - Create `effects` and `models` submodules and attach them to the parent
///   module.
/// - Register the submodules in `sys.modules` so they are importable via
///   dotted paths from Python.
///
/// Errors
/// ------
/// - `PyErr` if creating submodules or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_causal<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let effects_mod = PyModule::new(_py, "effects")?;
    let models_mod = PyModule::new(_py, "models")?;
    effects_submodule(_py, m, &effects_mod)?;
    models_submodule(_py, m, &models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_causal.effects", effects_mod)?;
    _py.import("sys")?.getattr("modules")?.set_item("rust_causal.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn effects_submodule<'py>(
    _py: Python, rust_causal: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<TotalEffects>()?;
    rust_causal.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn models_submodule<'py>(
    _py: Python, rust_causal: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<LinearModel>()?;
    m.add_class::<EffectsEstimates>()?;
    rust_causal.add_submodule(m)?;
    Ok(())
}

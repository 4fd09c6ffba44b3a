#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use numpy::PyReadonlyArray2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    model::{Adjacency, LinearEquations, ModelSpec},
    optimization::{ad_estimator::EstimatorOptions, minimizer::{Method, MinimizerOptions, Tolerances}},
};

/// Copy a 2-D `float64` array (numpy, pandas `DataFrame.to_numpy()`, or a
/// list of rows) into an owned `Array2`.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or list of float64 rows",
        )
    })?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err("rows must all have the same length"));
    }
    let nrows = rows.len();
    Array2::from_shape_vec((nrows, ncols), rows.concat())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Optional 2-D array argument.
#[cfg(feature = "python-bindings")]
pub fn extract_optional_matrix<'py>(
    raw: Option<&Bound<'py, PyAny>>,
) -> PyResult<Option<Array2<f64>>> {
    raw.map(extract_f64_matrix).transpose()
}

/// Rows of `mat` as nested vectors for Python getters.
#[cfg(feature = "python-bindings")]
pub fn matrix_rows(mat: &Array2<f64>) -> Vec<Vec<f64>> {
    mat.outer_iter().map(|row| row.to_vec()).collect()
}

/// Build the specification and linear adjacency of a `LinearModel`.
#[cfg(feature = "python-bindings")]
pub fn build_linear_model(
    xvars: Vec<String>, yvars: Vec<String>, ymvars: Option<Vec<String>>, final_var: Option<&str>,
    mx: Array2<f64>, my: Array2<f64>, alpha: f64, show_nr_indiv: usize,
    max_epochs: Option<usize>,
) -> PyResult<(ModelSpec, Adjacency<LinearEquations>)> {
    let ymvars = ymvars.unwrap_or_else(|| yvars.clone());
    let final_var = match final_var {
        Some(name) => name.to_string(),
        None => yvars.last().cloned().ok_or_else(|| PyValueError::new_err("yvars must not be empty"))?,
    };

    let estimator = match max_epochs {
        Some(n) => EstimatorOptions::default().with_max_epochs(n)?,
        None => EstimatorOptions::default(),
    };
    let spec = ModelSpec::new(xvars.as_slice(), yvars.as_slice(), ymvars.as_slice(), &final_var)?
        .with_alpha(alpha)?
        .with_show_nr_indiv(show_nr_indiv)
        .with_estimator(estimator);
    let adjacency = Adjacency::new(LinearEquations::new(mx, my)?)?;
    Ok((spec, adjacency))
}

/// Minimizer options for the bias estimator from Python keywords.
#[cfg(feature = "python-bindings")]
pub fn extract_minimizer_opts(
    method: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
) -> PyResult<MinimizerOptions> {
    let method = match method {
        Some(name) => name.parse::<Method>()?,
        None => Method::default(),
    };
    let tols = Tolerances::new(tol_grad, tol_cost, max_iter)?;
    Ok(MinimizerOptions::new(tols, method, false))
}

//! Observed data for structural models.
//!
//! Purpose
//! -------
//! Validate exogenous and manifest endogenous observations against a
//! [`ModelSpec`], drop incomplete observations, and precompute the centered
//! data, location statistics, and residual weights used by estimation.
//!
//! Key behaviors
//! -------------
//! - [`ObservedData::new`] requires every observation to be complete;
//!   [`ObservedData::with_min_obs`] accepts a reduced sample down to a floor.
//! - Columns with a missing (NaN) manifest value are removed from both
//!   `xdat` and `ymdat`.
//! - `selwei = diag(1 / var(ymcdat_i))` with population variances.
//!
//! Invariants & assumptions
//! ------------------------
//! - `xdat` is `m×tau` and finite; `ymdat` is `p×tau` with rows in
//!   `spec.manifest_order()`.
//! - Every manifest variable has positive variance after filtering.
//!
//! Testing notes
//! -------------
//! - Unit tests cover centering, weights, filtering, and each rejection.
use crate::model::{
    errors::{ModelError, ModelResult},
    spec::ModelSpec,
};
use ndarray::{Array1, Array2, Axis};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Validated observations with derived statistics.
///
/// Fields
/// ------
/// - `xdat` (`m×tau`), `ymdat` (`p×tau`): complete observations.
/// - `xmean`, `ymmean`: row means.
/// - `xcdat`, `ymcdat`: row-centered data.
/// - `xmedian`: row medians of `xdat`.
/// - `selwei` (`p×p`): diagonal residual weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedData {
    pub xdat: Array2<f64>,
    pub ymdat: Array2<f64>,
    pub xmean: Array1<f64>,
    pub ymmean: Array1<f64>,
    pub xcdat: Array2<f64>,
    pub ymcdat: Array2<f64>,
    pub xmedian: Array1<f64>,
    pub selwei: Array2<f64>,
}

impl ObservedData {
    /// Validate complete observations.
    ///
    /// # Errors
    /// - `ModelError::SampleSizeReduced` if any observation has a missing
    ///   manifest value.
    /// - See [`ObservedData::with_min_obs`] for the remaining variants.
    pub fn new(xdat: Array2<f64>, ymdat: Array2<f64>, spec: &ModelSpec) -> ModelResult<Self> {
        let requested = xdat.ncols();
        Self::with_min_obs(xdat, ymdat, spec, requested)
    }

    /// Validate observations, dropping incomplete ones as long as at least
    /// `min_obs` remain.
    ///
    /// Errors
    /// ------
    /// - `ModelError::ExogenousDimMismatch` / `ManifestDimMismatch` if the
    ///   row counts differ from `mdim` / `pdim`.
    /// - `ModelError::ObservationMismatch` if the column counts differ.
    /// - `ModelError::NonFiniteData` for a non-finite exogenous value.
    /// - `ModelError::SampleSizeReduced` if fewer than `min_obs` complete
    ///   observations remain (or none at all).
    /// - `ModelError::ZeroVariance` for a constant manifest variable.
    pub fn with_min_obs(
        xdat: Array2<f64>, ymdat: Array2<f64>, spec: &ModelSpec, min_obs: usize,
    ) -> ModelResult<Self> {
        if xdat.nrows() != spec.mdim() {
            return Err(ModelError::ExogenousDimMismatch { expected: spec.mdim(), found: xdat.nrows() });
        }
        if ymdat.nrows() != spec.pdim() {
            return Err(ModelError::ManifestDimMismatch { expected: spec.pdim(), found: ymdat.nrows() });
        }
        if xdat.ncols() != ymdat.ncols() {
            return Err(ModelError::ObservationMismatch { xobs: xdat.ncols(), yobs: ymdat.ncols() });
        }
        if let Some(((row, col), _)) = xdat.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::NonFiniteData { row, col });
        }

        let requested = xdat.ncols();
        let keep: Vec<usize> = ymdat
            .axis_iter(Axis(1))
            .enumerate()
            .filter(|(_, col)| col.iter().all(|v| !v.is_nan()))
            .map(|(j, _)| j)
            .collect();
        let actual = keep.len();
        if actual < min_obs.max(1) {
            return Err(ModelError::SampleSizeReduced { requested, actual });
        }
        let (xdat, ymdat) = if actual < requested {
            log::warn!("dropped {} incomplete observations of {requested}", requested - actual);
            (xdat.select(Axis(1), &keep), ymdat.select(Axis(1), &keep))
        } else {
            (xdat, ymdat)
        };

        let xmean = row_means(&xdat);
        let ymmean = row_means(&ymdat);
        let xcdat = &xdat - &xmean.view().insert_axis(Axis(1));
        let ymcdat = &ymdat - &ymmean.view().insert_axis(Axis(1));
        let xmedian = row_medians(&xdat);

        let manifest = spec.manifest_order();
        let mut selwei = Array2::<f64>::zeros((spec.pdim(), spec.pdim()));
        for (i, row) in ymcdat.axis_iter(Axis(0)).enumerate() {
            let var = row.iter().population_variance();
            if var.is_nan() || var <= 0.0 {
                return Err(ModelError::ZeroVariance { variable: manifest[i].to_string() });
            }
            selwei[[i, i]] = 1.0 / var;
        }

        Ok(Self { xdat, ymdat, xmean, ymmean, xcdat, ymcdat, xmedian, selwei })
    }

    /// Number of observations `tau`.
    pub fn tau(&self) -> usize {
        self.xdat.ncols()
    }

    /// Number of scalar residuals, `tau · p`.
    pub fn nobs(&self) -> usize {
        self.tau() * self.ymdat.nrows()
    }
}

// ---- Helper methods ----

pub(crate) fn row_means(mat: &Array2<f64>) -> Array1<f64> {
    mat.axis_iter(Axis(0)).map(|row| row.iter().mean()).collect()
}

pub(crate) fn row_medians(mat: &Array2<f64>) -> Array1<f64> {
    mat.axis_iter(Axis(0)).map(|row| Data::new(row.to_vec()).median()).collect()
}

//! Model specification: variable lists, final variable, and estimation
//! settings.
//!
//! Purpose
//! -------
//! Hold the immutable configuration of a structural model and the selection
//! objects derived from it. Results live in separate records
//! (`ModelSetup`, `Estimates`, `BiasEstimate`).
//!
//! Invariants & assumptions
//! ------------------------
//! - `xvars`, `yvars`, `ymvars` are non-empty and free of duplicates.
//! - `ymvars ⊆ yvars` and `final_var ∈ yvars`.
//! - `alpha` is finite and non-negative.
//!
//! Conventions
//! -----------
//! - `selvec[i] = 1.0` iff `yvars[i]` is manifest; `fym` stacks the rows of
//!   the identity at manifest positions in `yvars` order, so manifest data
//!   must be supplied in that order too.
use crate::{
    model::errors::{ModelError, ModelResult},
    optimization::ad_estimator::EstimatorOptions,
};
use ndarray::{Array1, Array2};
use std::collections::HashSet;

/// Immutable specification of a structural model.
///
/// Fields
/// ------
/// - `xvars` (`m`), `yvars` (`n`): exogenous and endogenous names, in
///   equation order for `yvars`.
/// - `ymvars` (`p`): manifest (observed) endogenous names.
/// - `final_var`: endogenous variable whose mediation is analysed.
/// - `alpha`: Tikhonov weight of the estimation objective.
/// - `show_nr_indiv`: number of leading observations with individual
///   theoretical effects.
/// - `estimator`: stop rule and Adam settings for direct-effect estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub xvars: Vec<String>,
    pub yvars: Vec<String>,
    pub ymvars: Vec<String>,
    pub final_var: String,
    pub alpha: f64,
    pub show_nr_indiv: usize,
    pub estimator: EstimatorOptions,
}

impl ModelSpec {
    /// Construct a validated specification with `alpha = 0`,
    /// `show_nr_indiv = 0`, and default estimator options.
    ///
    /// Errors
    /// ------
    /// - `ModelError::EmptyVariables` for an empty list.
    /// - `ModelError::DuplicateVariable` for a repeated name in any list or
    ///   across `xvars` and `yvars`.
    /// - `ModelError::UnknownVariable` if a manifest name or `final_var` is
    ///   not in `yvars`.
    pub fn new<S: AsRef<str>>(
        xvars: &[S], yvars: &[S], ymvars: &[S], final_var: &str,
    ) -> ModelResult<Self> {
        let xvars = to_owned_names(xvars, "xvars")?;
        let yvars = to_owned_names(yvars, "yvars")?;
        let ymvars = to_owned_names(ymvars, "ymvars")?;
        if let Some(name) = xvars.iter().find(|x| yvars.contains(x)) {
            return Err(ModelError::DuplicateVariable { name: name.clone() });
        }
        if let Some(name) = ymvars.iter().find(|y| !yvars.contains(y)) {
            return Err(ModelError::UnknownVariable { name: name.clone() });
        }
        if !yvars.iter().any(|y| y == final_var) {
            return Err(ModelError::UnknownVariable { name: final_var.to_string() });
        }
        Ok(Self {
            xvars,
            yvars,
            ymvars,
            final_var: final_var.to_string(),
            alpha: 0.0,
            show_nr_indiv: 0,
            estimator: EstimatorOptions::default(),
        })
    }

    /// Set the Tikhonov weight.
    ///
    /// # Errors
    /// `ModelError::InvalidAlpha` if `alpha` is negative or non-finite.
    pub fn with_alpha(mut self, alpha: f64) -> ModelResult<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ModelError::InvalidAlpha { alpha });
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// Set the number of observations with individual theoretical effects.
    /// Checked against the sample size in `create_model`.
    pub fn with_show_nr_indiv(mut self, show_nr_indiv: usize) -> Self {
        self.show_nr_indiv = show_nr_indiv;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorOptions) -> Self {
        self.estimator = estimator;
        self
    }

    /// Number of endogenous variables `n`.
    pub fn ndim(&self) -> usize {
        self.yvars.len()
    }

    /// Number of exogenous variables `m`.
    pub fn mdim(&self) -> usize {
        self.xvars.len()
    }

    /// Number of manifest endogenous variables `p`.
    pub fn pdim(&self) -> usize {
        self.ymvars.len()
    }

    /// Index of `final_var` in `yvars`.
    pub fn jvar(&self) -> usize {
        self.yvars.iter().position(|y| *y == self.final_var).unwrap_or_default()
    }

    /// Manifest indicator over `yvars`.
    pub fn selvec(&self) -> Array1<f64> {
        self.yvars.iter().map(|y| if self.ymvars.contains(y) { 1.0 } else { 0.0 }).collect()
    }

    /// Manifest selection matrix `fym` (`p×n`).
    pub fn fym(&self) -> Array2<f64> {
        let selvec = self.selvec();
        let rows: Vec<usize> = (0..self.ndim()).filter(|&i| selvec[i] == 1.0).collect();
        let mut fym = Array2::<f64>::zeros((rows.len(), self.ndim()));
        for (r, &i) in rows.iter().enumerate() {
            fym[[r, i]] = 1.0;
        }
        fym
    }

    /// Manifest names in `yvars` order, the row order expected of `ymdat`.
    pub fn manifest_order(&self) -> Vec<&str> {
        self.yvars.iter().filter(|y| self.ymvars.contains(y)).map(String::as_str).collect()
    }
}

// ---- Helper methods ----

fn to_owned_names<S: AsRef<str>>(names: &[S], which: &'static str) -> ModelResult<Vec<String>> {
    if names.is_empty() {
        return Err(ModelError::EmptyVariables { which });
    }
    let mut seen = HashSet::with_capacity(names.len());
    let mut owned = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if !seen.insert(name) {
            return Err(ModelError::DuplicateVariable { name: name.to_string() });
        }
        owned.push(name.to_string());
    }
    Ok(owned)
}

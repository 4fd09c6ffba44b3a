//! ad_estimator::options — configuration for the structural-network fit.
//!
//! Purpose
//! -------
//! Collect the knobs of the direct-effects estimation in one validated
//! record: the termination rule (relative SSE tolerance, epoch floor,
//! convergence streak, epoch cap) and the Adam hyper-parameters.
//!
//! Key behaviors
//! -------------
//! - [`EstimatorOptions::new`] validates every field and returns
//!   [`OptResult`]; [`EstimatorOptions::default`] yields the standard
//!   settings (`rel = 1e-5`, `epochs_min = 90`, `nr_conv_min = 5`,
//!   `max_epochs = 20_000`, `lr = 1e-3`, `β₁ = 0.9`, `β₂ = 0.999`,
//!   `ε = 1e-8`).
//!
//! Invariants & assumptions
//! ------------------------
//! - `max_epochs ≥ epochs_min ≥ 1` and `nr_conv_min ≥ 1`; otherwise the
//!   termination rule could never fire before the cap.
//! - Adam decay rates lie in `[0, 1)`; step size and `ε` are finite and
//!   strictly positive.
//!
//! Testing notes
//! -------------
//! - Unit tests check the defaults and each rejection path.
use crate::optimization::errors::{OptError, OptResult};

/// Default relative SSE change below which an epoch counts as converged.
pub const DEFAULT_REL_TOL: f64 = 1e-5;
/// Default minimum number of epochs before termination is allowed.
pub const DEFAULT_EPOCHS_MIN: usize = 90;
/// Default number of consecutive converged epochs required to stop.
pub const DEFAULT_NR_CONV_MIN: usize = 5;
/// Default hard cap on the number of epochs.
pub const DEFAULT_MAX_EPOCHS: usize = 20_000;

/// EstimatorOptions — termination rule and Adam settings.
///
/// Fields
/// ------
/// - `rel`: relative SSE change tolerance `|sse − sse_old| / sse_old`.
/// - `epochs_min`: minimum epochs before the rule may terminate.
/// - `nr_conv_min`: consecutive converged epochs required.
/// - `max_epochs`: epoch cap; reaching it is reported as
///   [`OptError::MaxEpochsReached`].
/// - `learning_rate`, `beta1`, `beta2`, `eps`: Adam hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    pub rel: f64,
    pub epochs_min: usize,
    pub nr_conv_min: usize,
    pub max_epochs: usize,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl EstimatorOptions {
    /// Construct validated estimator options.
    ///
    /// Errors
    /// ------
    /// - `OptError::InvalidRelTol` if `rel` is not finite and positive.
    /// - `OptError::InvalidEpochs` if `epochs_min == 0`, `nr_conv_min == 0`,
    ///   or `max_epochs < epochs_min`.
    /// - `OptError::InvalidLearningRate` if `learning_rate` is not finite and
    ///   positive.
    /// - `OptError::InvalidMomentDecay` if `beta1` or `beta2` is outside
    ///   `[0, 1)`.
    /// - `OptError::InvalidEpsilon` if `eps` is not finite and positive.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rel: f64, epochs_min: usize, nr_conv_min: usize, max_epochs: usize, learning_rate: f64,
        beta1: f64, beta2: f64, eps: f64,
    ) -> OptResult<Self> {
        if !rel.is_finite() || rel <= 0.0 {
            return Err(OptError::InvalidRelTol {
                tol: rel,
                reason: "Relative tolerance must be finite and positive.",
            });
        }
        if epochs_min == 0 || nr_conv_min == 0 {
            return Err(OptError::InvalidEpochs {
                epochs_min,
                nr_conv_min,
                max_epochs,
                reason: "Epoch floor and convergence streak must be at least one.",
            });
        }
        if max_epochs < epochs_min {
            return Err(OptError::InvalidEpochs {
                epochs_min,
                nr_conv_min,
                max_epochs,
                reason: "Epoch cap must not be below the epoch floor.",
            });
        }
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(OptError::InvalidLearningRate {
                lr: learning_rate,
                reason: "Learning rate must be finite and positive.",
            });
        }
        for beta in [beta1, beta2] {
            if !(0.0..1.0).contains(&beta) {
                return Err(OptError::InvalidMomentDecay {
                    beta,
                    reason: "Moment decay rates must lie in [0, 1).",
                });
            }
        }
        if !eps.is_finite() || eps <= 0.0 {
            return Err(OptError::InvalidEpsilon {
                eps,
                reason: "Epsilon must be finite and positive.",
            });
        }
        Ok(Self { rel, epochs_min, nr_conv_min, max_epochs, learning_rate, beta1, beta2, eps })
    }

    /// Default options with a different epoch cap.
    ///
    /// # Errors
    /// Same as [`EstimatorOptions::new`].
    pub fn with_max_epochs(self, max_epochs: usize) -> OptResult<Self> {
        Self::new(
            self.rel,
            self.epochs_min,
            self.nr_conv_min,
            max_epochs,
            self.learning_rate,
            self.beta1,
            self.beta2,
            self.eps,
        )
    }
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            rel: DEFAULT_REL_TOL,
            epochs_min: DEFAULT_EPOCHS_MIN,
            nr_conv_min: DEFAULT_NR_CONV_MIN,
            max_epochs: DEFAULT_MAX_EPOCHS,
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Default values of the termination rule and Adam settings.
    // - Each validation failure in `EstimatorOptions::new`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Pin the documented defaults.
    //
    // Given
    // -----
    // - `EstimatorOptions::default()`.
    //
    // Expect
    // ------
    // - `rel = 1e-5`, `epochs_min = 90`, `nr_conv_min = 5`, and the defaults
    //   pass validation.
    fn defaults_match_documented_rule() {
        let opts = EstimatorOptions::default();

        assert_eq!(opts.rel, 1e-5);
        assert_eq!(opts.epochs_min, 90);
        assert_eq!(opts.nr_conv_min, 5);
        assert!(opts.with_max_epochs(opts.max_epochs).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid settings are rejected with the matching variant.
    //
    // Given
    // -----
    // - Negative `rel`, zero streak, cap below floor, `β₁ = 1`, zero `ε`.
    //
    // Expect
    // ------
    // - `InvalidRelTol`, `InvalidEpochs` (twice), `InvalidMomentDecay`,
    //   `InvalidEpsilon`.
    fn new_rejects_invalid_settings() {
        let d = EstimatorOptions::default();

        assert!(matches!(
            EstimatorOptions::new(-1.0, 90, 5, 100, 1e-3, 0.9, 0.999, 1e-8),
            Err(OptError::InvalidRelTol { .. })
        ));
        assert!(matches!(
            EstimatorOptions::new(d.rel, 90, 0, 100, 1e-3, 0.9, 0.999, 1e-8),
            Err(OptError::InvalidEpochs { .. })
        ));
        assert!(matches!(d.with_max_epochs(10), Err(OptError::InvalidEpochs { .. })));
        assert!(matches!(
            EstimatorOptions::new(d.rel, 90, 5, 100, 1e-3, 1.0, 0.999, 1e-8),
            Err(OptError::InvalidMomentDecay { .. })
        ));
        assert!(matches!(
            EstimatorOptions::new(d.rel, 90, 5, 100, 1e-3, 0.9, 0.999, 0.0),
            Err(OptError::InvalidEpsilon { .. })
        ));
    }
}

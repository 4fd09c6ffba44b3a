//! Equation systems behind a differentiation capability.
//!
//! Purpose
//! -------
//! Decouple the effects and estimation code from how equations are written
//! down. Any system `y_i = f_i(x, y)` that can evaluate its right-hand sides
//! and report which variables each equation depends on can be analysed; the
//! partial derivatives default to central finite differences.
//!
//! Key behaviors
//! -------------
//! - [`DifferentiableModel`]: `evaluate`, `dependence`, and `derivatives`.
//! - [`LinearEquations`]: exact linear system `y = mx·x + my·y`.
//!
//! Conventions
//! -----------
//! - `derivatives(x, y)` returns `(mx, my)` with `mx[i, j] = ∂f_i/∂x_j` and
//!   `my[i, j] = ∂f_i/∂y_j`, holding the other arguments fixed.
//! - `dependence()` is the algebraic nonzero pattern; entries that vanish
//!   only at particular points must still be reported as dependencies.
use crate::{
    effects::{identification::digital, total::check_shape},
    model::errors::{ModelError, ModelResult},
    optimization::{errors::OptResult, minimizer::finite_diff::compute_jacobian},
};
use ndarray::{Array1, Array2, concatenate, s, Axis};

/// Equation system with numeric evaluation and partial derivatives.
pub trait DifferentiableModel {
    /// Number of exogenous variables `m`.
    fn xdim(&self) -> usize;

    /// Number of equations / endogenous variables `n`.
    fn ydim(&self) -> usize;

    /// Right-hand sides `f(x, y)`, one entry per equation.
    fn evaluate(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<f64>;

    /// Dependency patterns `(idx, idy)`: nonzero where `f_i` depends on
    /// `x_j` / `y_j`.
    fn dependence(&self) -> (Array2<f64>, Array2<f64>);

    /// Direct effects `(mx, my)` at `(x, y)`.
    ///
    /// The default differentiates `evaluate` by central differences over
    /// the stacked argument `[x; y]`.
    ///
    /// # Errors
    /// `ModelError::Optimization` if the finite-difference Jacobian is not
    /// finite.
    fn derivatives(
        &self, x: &Array1<f64>, y: &Array1<f64>,
    ) -> ModelResult<(Array2<f64>, Array2<f64>)> {
        let m = self.xdim();
        let rhs = |z: &Array1<f64>| -> OptResult<Array1<f64>> {
            let x = z.slice(s![..m]).to_owned();
            let y = z.slice(s![m..]).to_owned();
            Ok(self.evaluate(&x, &y))
        };
        let z = concatenate![Axis(0), x.view(), y.view()];
        let jac = compute_jacobian(&rhs, &z)?;
        Ok((jac.slice(s![.., ..m]).to_owned(), jac.slice(s![.., m..]).to_owned()))
    }
}

/// Linear equation system `y = mx·x + my·y`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquations {
    mx: Array2<f64>,
    my: Array2<f64>,
}

impl LinearEquations {
    /// # Errors
    /// `ModelError::Effects(DimensionMismatch)` unless `my` is `n×n` with
    /// `n = mx.nrows()`.
    pub fn new(mx: Array2<f64>, my: Array2<f64>) -> ModelResult<Self> {
        let n = mx.nrows();
        check_shape("my", &my, (n, n))?;
        if mx.ncols() == 0 || n == 0 {
            return Err(ModelError::EquationDimMismatch {
                which: "variables",
                expected: 1,
                found: 0,
            });
        }
        Ok(Self { mx, my })
    }

    pub fn mx(&self) -> &Array2<f64> {
        &self.mx
    }

    pub fn my(&self) -> &Array2<f64> {
        &self.my
    }
}

impl DifferentiableModel for LinearEquations {
    fn xdim(&self) -> usize {
        self.mx.ncols()
    }

    fn ydim(&self) -> usize {
        self.mx.nrows()
    }

    fn evaluate(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
        self.mx.dot(x) + self.my.dot(y)
    }

    fn dependence(&self) -> (Array2<f64>, Array2<f64>) {
        (digital(&self.mx), digital(&self.my))
    }

    fn derivatives(
        &self, _x: &Array1<f64>, _y: &Array1<f64>,
    ) -> ModelResult<(Array2<f64>, Array2<f64>)> {
        Ok((self.mx.clone(), self.my.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact derivatives and patterns of `LinearEquations`.
    // - The finite-difference default of `derivatives` on a nonlinear system.
    // -------------------------------------------------------------------------

    /// `y1 = x1·x2`, `y2 = y1² + 3·x2`.
    struct Product;

    impl DifferentiableModel for Product {
        fn xdim(&self) -> usize {
            2
        }

        fn ydim(&self) -> usize {
            2
        }

        fn evaluate(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
            array![x[0] * x[1], y[0] * y[0] + 3.0 * x[1]]
        }

        fn dependence(&self) -> (Array2<f64>, Array2<f64>) {
            (array![[1.0, 1.0], [0.0, 1.0]], array![[0.0, 0.0], [1.0, 0.0]])
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the linear system reports its coefficients and patterns.
    //
    // Given
    // -----
    // - `mx = [[2, 0], [0, -1]]`, `my = [[0, 0], [0.5, 0]]`.
    //
    // Expect
    // ------
    // - `evaluate` is affine, `derivatives` returns the coefficients,
    //   `dependence` their binarized patterns.
    fn linear_equations_are_exact() {
        let eqs = LinearEquations::new(array![[2.0, 0.0], [0.0, -1.0]], array![[0.0, 0.0], [0.5, 0.0]])
            .expect("valid system");

        let x = array![1.0, 2.0];
        let y = array![2.0, 0.0];
        assert_eq!(eqs.evaluate(&x, &y), array![2.0, -1.0]);
        let (mx, my) = eqs.derivatives(&x, &y).expect("derivatives");
        assert_eq!(mx, *eqs.mx());
        assert_eq!(my, *eqs.my());
        let (idx, idy) = eqs.dependence();
        assert_eq!(idx, array![[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(idy, array![[0.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Check the finite-difference default against hand derivatives.
    //
    // Given
    // -----
    // - `Product` at `x = (2, 3)`, `y = (6, 0)`.
    //
    // Expect
    // ------
    // - `mx = [[3, 2], [0, 3]]`, `my = [[0, 0], [12, 0]]` to 1e-6.
    fn default_derivatives_match_hand_derivatives() {
        let (mx, my) = Product.derivatives(&array![2.0, 3.0], &array![6.0, 0.0]).expect("fd");

        let mx_expected = array![[3.0, 2.0], [0.0, 3.0]];
        let my_expected = array![[0.0, 0.0], [12.0, 0.0]];
        for (a, b) in mx.iter().zip(mx_expected.iter()).chain(my.iter().zip(my_expected.iter())) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a non-square `my` is rejected.
    //
    // Given
    // -----
    // - `mx` 2×1, `my` 2×3.
    //
    // Expect
    // ------
    // - `ModelError::Effects(DimensionMismatch)`.
    fn linear_equations_reject_bad_shapes() {
        let err = LinearEquations::new(Array2::zeros((2, 1)), Array2::zeros((2, 3)))
            .expect_err("bad shape");

        assert!(matches!(err, ModelError::Effects(_)));
    }
}

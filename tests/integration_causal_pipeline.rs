//! Integration tests for the structural effects pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: specification and equations, observed
//!   data, theoretical effects, Adam estimation of direct effects, and
//!   delta-method standard deviations.
//! - Exercise simulated samples with Gaussian disturbances rather than
//!   hand-tuned toy data only.
//!
//! Coverage
//! --------
//! - `model::{spec, adjacency, data, setup}`: construction on a
//!   three-equation linear system and on a nonlinear system with
//!   finite-difference derivatives.
//! - `model::estimate`: recovery of direct and total effects, standard
//!   deviation support, and the Jacobian cross-check.
//! - `model::bias`: recovery of an injected equation shift.
//! - `effects` and `inference`: through the pipeline only.
//!
//! Exclusions
//! ----------
//! - Low-level building blocks (vectorization, pseudoinverse, Adam stop
//!   rule) are covered by unit tests.
//! - Python bindings.
use ndarray::{Array1, Array2, Axis, array};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use rust_causal::model::prelude::*;

const TAU: usize = 200;
const NOISE_SD: f64 = 0.1;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Three-equation linear system
/// `y1 = 0.7·x1`, `y2 = −0.4·x2 + 0.5·y1`, `y3 = 1.3·x1 + 0.2·y1 − 0.8·y2`.
fn three_equation_system() -> (ModelSpec, Adjacency<LinearEquations>) {
    let spec = ModelSpec::new(&["x1", "x2"], &["y1", "y2", "y3"], &["y1", "y2", "y3"], "y3")
        .expect("valid spec");
    let eqs = LinearEquations::new(
        array![[0.7, 0.0], [0.0, -0.4], [1.3, 0.0]],
        array![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [0.2, -0.8, 0.0]],
    )
    .expect("valid equations");
    (spec, Adjacency::new(eqs).expect("acyclic"))
}

/// Simulate `tau` observations: standard normal exogenous variables and
/// per-equation Gaussian disturbances, with `shift` added to equation
/// `shift_ind`. Disturbances propagate downstream.
fn simulate(
    adjacency: &Adjacency<LinearEquations>, tau: usize, shift: f64, shift_ind: usize, seed: u64,
) -> (Array2<f64>, Array2<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x_dist = Normal::new(0.0, 1.0).expect("valid normal");
    let e_dist = Normal::new(0.0, NOISE_SD).expect("valid normal");
    let (m, n) = (adjacency.mdim(), adjacency.ndim());
    let eqs = adjacency.equations();

    let xdat = Array2::from_shape_fn((m, tau), |_| x_dist.sample(&mut rng));
    let mut ydat = Array2::<f64>::zeros((n, tau));
    for (x, mut y_col) in xdat.axis_iter(Axis(1)).zip(ydat.axis_iter_mut(Axis(1))) {
        let x = x.to_owned();
        let mut y = Array1::<f64>::zeros(n);
        for &i in adjacency.order() {
            let shock = e_dist.sample(&mut rng) + if i == shift_ind { shift } else { 0.0 };
            y[i] = eqs.evaluate(&x, &y)[i] + shock;
        }
        y_col.assign(&y);
    }
    (xdat, ydat)
}

#[test]
// Purpose
// -------
// Run the full estimation pipeline on simulated data from the
// three-equation system.
//
// Given
// -----
// - 200 observations, disturbances with standard deviation 0.1.
//
// Expect
// ------
// - Direct effects within 0.1 of the data-generating values.
// - Total effects close to the theoretical ones (relative accuracy < 0.05).
// - Positive standard deviations exactly on the identified support.
// - Algebraic and numeric Jacobians agree.
fn linear_pipeline_recovers_effects() {
    init_logging();
    let (spec, adjacency) = three_equation_system();
    let (xdat, ymdat) = simulate(&adjacency, TAU, 0.0, 0, 7);
    let data = ObservedData::new(xdat, ymdat, &spec).expect("complete data");

    let setup = create_model(&spec, &adjacency, &data).expect("setup");
    let est = estimate_effects(&spec, &setup, &data).expect("estimates");

    assert_eq!(setup.ident.qdim, 6);
    for (hat, theo) in est.direct_hat.iter().zip(setup.theo.direct.iter()) {
        assert!((hat - theo).abs() < 0.1, "direct {hat} vs {theo}");
    }
    assert!(relative_accuracy(&est.ex_hat, &setup.theo.ex) < 0.05);
    assert!(relative_accuracy(&est.ey_hat, &setup.theo.ey) < 0.05);

    for ((std, id), val) in est.mx_std.iter().zip(setup.ident.idx.iter()).zip(est.mx_hat.iter()) {
        if *id == 0.0 {
            assert_eq!(*std, 0.0);
            assert_eq!(*val, 0.0);
        } else {
            assert!(*std > 0.0 && std.is_finite());
        }
    }
    assert!(est.ey_std.diag().iter().all(|&s| s == 0.0));
    assert!(est.jacobian_check.allclose, "max diff {}", est.jacobian_check.max_abs_diff);
    assert_eq!(est.exj_hat, est.ex_hat.row(2).to_owned());
}

/// `y1 = x1·x2`, `y2 = 0.5·y1² + x2`.
struct Interaction;

impl DifferentiableModel for Interaction {
    fn xdim(&self) -> usize {
        2
    }

    fn ydim(&self) -> usize {
        2
    }

    fn evaluate(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
        array![x[0] * x[1], 0.5 * y[0] * y[0] + x[1]]
    }

    fn dependence(&self) -> (Array2<f64>, Array2<f64>) {
        (array![[1.0, 1.0], [0.0, 1.0]], array![[0.0, 0.0], [1.0, 0.0]])
    }
}

#[test]
// Purpose
// -------
// Check theoretical total effects of a nonlinear system against
// finite differences of the solved model.
//
// Given
// -----
// - `Interaction` with exogenous data centered near `(1, 2)`.
//
// Expect
// ------
// - `ex[i, j] ≈ ∂y_i/∂x_j` of `Adjacency::solve` at `xmean` to 1e-5.
// - Individual effects for the first three observations.
fn nonlinear_theoretical_effects_match_finite_differences() {
    init_logging();
    let spec = ModelSpec::new(&["x1", "x2"], &["y1", "y2"], &["y2"], "y2")
        .expect("valid spec")
        .with_show_nr_indiv(3);
    let adjacency = Adjacency::new(Interaction).expect("acyclic");
    let xdat = array![[0.8, 1.1, 0.9, 1.2, 1.0], [2.1, 1.9, 2.2, 1.8, 2.0]];
    let yhat = adjacency.model(&xdat, 0.0, 0).expect("solvable");
    let ymdat = yhat.select(Axis(0), &[1]) + &array![[0.01, -0.02, 0.015, -0.01, 0.005]];
    let data = ObservedData::new(xdat, ymdat, &spec).expect("complete data");

    let setup = create_model(&spec, &adjacency, &data).expect("setup");

    let h = 1e-6;
    for j in 0..2 {
        let mut up = data.xmean.clone();
        let mut down = data.xmean.clone();
        up[j] += h;
        down[j] -= h;
        let dy = (adjacency.solve(&up, 0.0, 0).expect("solve")
            - adjacency.solve(&down, 0.0, 0).expect("solve"))
            / (2.0 * h);
        for i in 0..2 {
            assert!((setup.theo.ex[[i, j]] - dy[i]).abs() < 1e-5, "ex[{i},{j}]");
        }
    }
    assert_eq!(setup.indiv.len(), 3);
    assert_eq!(setup.fym, array![[0.0, 1.0]]);
}

#[test]
// Purpose
// -------
// Verify bias estimation recovers a shift injected into one equation.
//
// Given
// -----
// - The three-equation system with a shift of 0.5 on `y2`.
//
// Expect
// ------
// - `bias ≈ 0.5` to 0.05 on equation 1, positive Hessian.
// - The shifted equation has the smallest bias SSE among all equations.
fn bias_recovers_injected_shift() {
    init_logging();
    let (spec, adjacency) = three_equation_system();
    let (xdat, ymdat) = simulate(&adjacency, TAU, 0.5, 1, 11);
    let data = ObservedData::new(xdat, ymdat, &spec).expect("complete data");

    let biases = estimate_biases(&spec, &adjacency, &data, &Default::default()).expect("biases");

    let shifted = &biases[1];
    assert_eq!(shifted.variable, "y2");
    assert!((shifted.bias - 0.5).abs() < 0.05, "bias {}", shifted.bias);
    assert!(shifted.hessian > 0.0);
    let best = biases
        .iter()
        .min_by(|a, b| a.sse.total_cmp(&b.sse))
        .map(|b| b.bias_ind);
    assert_eq!(best, Some(1));
}

#[test]
// Purpose
// -------
// Ensure missing manifest values are reported with counts.
//
// Given
// -----
// - A simulated sample with two NaN entries in different observations.
//
// Expect
// ------
// - `SampleSizeReduced { requested: 200, actual: 198 }`; a floor of 150
//   accepts the reduced sample.
fn missing_values_reduce_sample() {
    init_logging();
    let (spec, adjacency) = three_equation_system();
    let (xdat, mut ymdat) = simulate(&adjacency, TAU, 0.0, 0, 3);
    ymdat[[0, 10]] = f64::NAN;
    ymdat[[2, 50]] = f64::NAN;

    let err = ObservedData::new(xdat.clone(), ymdat.clone(), &spec).expect_err("incomplete");
    let data = ObservedData::with_min_obs(xdat, ymdat, &spec, 150).expect("reduced sample");

    assert_eq!(err, ModelError::SampleSizeReduced { requested: 200, actual: 198 });
    assert_eq!(data.tau(), 198);
}

//! minimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the BFGS and Nelder–Mead solvers used
//! by [`minimize`](super::api::minimize). These helpers hide Argmin's generic
//! wiring and apply crate-level tolerances so higher-level code can request a
//! configured solver without touching Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct BFGS with More–Thuente line search and apply the optional
//!   gradient and cost-change tolerances.
//! - Construct a Nelder–Mead simplex around the starting point, offset by
//!   [`NELDER_MEAD_STEP`] along each axis, and apply `tol_cost` as the
//!   simplex standard-deviation tolerance.
//!
//! Invariants & assumptions
//! ------------------------
//! - The builders never set `max_iters`; iteration limits are applied by
//!   the runner.
//! - Argmin rejections of tolerance values surface as [`OptError`] through
//!   the crate's `From<Error>` conversion.
//!
//! Testing notes
//! -------------
//! - Unit tests check construction succeeds for valid tolerances and the
//!   simplex geometry.
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        traits::MinimizerOptions,
        types::{BfgsMoreThuente, MoreThuenteLS, NELDER_MEAD_STEP, NelderMeadSolver, Theta},
    },
};

/// Construct BFGS with More–Thuente line search.
///
/// Parameters
/// ----------
/// - `opts`: `&MinimizerOptions`
///   Source of `tols.tol_grad` and `tols.tol_cost`; `None` leaves Argmin's
///   defaults in place.
///
/// Returns
/// -------
/// `OptResult<BfgsMoreThuente>`
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
///   tolerance.
///
/// Notes
/// -----
/// - The initial inverse Hessian is not part of the solver; the runner sets
///   it on the executor state.
pub fn build_bfgs(opts: &MinimizerOptions) -> OptResult<BfgsMoreThuente> {
    let mut solver = BfgsMoreThuente::new(MoreThuenteLS::new());
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Construct a Nelder–Mead solver with an axis-aligned initial simplex.
///
/// The simplex has `theta0.len() + 1` vertices: `theta0` itself and
/// `theta0 + NELDER_MEAD_STEP·eᵢ` for every coordinate `i`.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects the
///   standard-deviation tolerance.
pub fn build_nelder_mead(theta0: &Theta, opts: &MinimizerOptions) -> OptResult<NelderMeadSolver> {
    let solver = NelderMeadSolver::new(simplex_around(theta0));
    match opts.tols.tol_cost {
        Some(c) => Ok(solver.with_sd_tolerance(c)?),
        None => Ok(solver),
    }
}

// ---- Helper methods ----

fn simplex_around(theta0: &Theta) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] += NELDER_MEAD_STEP;
        vertices.push(vertex);
    }
    vertices
}

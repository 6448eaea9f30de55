//! derivatives::finite_diff — finite-difference gradients and Hessians.
//!
//! Purpose
//! -------
//! Approximate first and second derivatives of the performance function in
//! standard normal space when analytical derivatives are missing or not
//! wanted, with deterministic stencils so that repeated runs from the same
//! start converge identically.
//!
//! Key behaviors
//! -------------
//! - Gradients: forward or central stencils with explicit steps, or the
//!   `finitediff` crate's √ε-scaled steps ([`fd_gradient`]).
//! - Hessians from an analytical gradient: difference the gradient column by
//!   column, then symmetrize ([`fd_hessian_from_gradient`]).
//! - Hessians from values only: diagonal terms
//!   `(f(u+hᵢ) − 2f(u) + f(u−hᵢ)) / hᵢ²` and mixed terms
//!   `(f(++) − f(+−) − f(−+) + f(−−)) / (4 hᵢ hⱼ)` for central stencils
//!   ([`fd_hessian_from_values`]); `O(n²)` evaluations.
//! - Value-only Hessians never go through `finitediff`; adaptive steps are
//!   scaled for second differences instead.
//! - Explicit-step stencils are assembled up front and evaluated in one
//!   batch, optionally on the rayon pool. Each perturbed point is
//!   independent, so evaluation order never changes the result.
//!
//! Invariants & assumptions
//! ------------------------
//! - The `finitediff` closures must return `f64`; the first error raised by
//!   the model is captured in a `RefCell<Option<ReliabilityError>>`, the
//!   closure returns `NaN`, and the captured error is surfaced afterwards.
//! - Every gradient/Hessian returned here has passed
//!   [`validate_grad`]/[`validate_hessian`]; Hessians are symmetric.
//!
//! Testing notes
//! -------------
//! - Unit tests cover exactness on quadratics, error capture, adaptive steps
//!   for both Hessian paths, and agreement between parallel and sequential
//!   stencils.
use std::cell::RefCell;

use finitediff::FiniteDiff;
use ndarray::Array2;
use rayon::prelude::*;

use crate::{
    derivatives::options::{DiffScheme, FiniteDiffOptions},
    errors::{ReliabilityError, ReliabilityResult},
    model::{
        types::{Grad, Hessian, Point},
        validation::{validate_grad, validate_hessian},
    },
};

/// fd_gradient — finite-difference gradient of a scalar function.
///
/// Parameters
/// ----------
/// - `f`: scalar function in standard normal space. Errors it returns are
///   propagated unchanged.
/// - `u`: evaluation point; its length fixes the gradient dimension.
/// - `opts`: scheme, step, and parallelism.
///
/// Errors
/// ------
/// - Any error returned by `f`.
/// - `ReliabilityError::DimensionMismatch` / `InvalidStep` from step
///   resolution.
/// - `ReliabilityError::InvalidGradient` when the estimate is non-finite.
pub fn fd_gradient<F>(f: &F, u: &Point, opts: &FiniteDiffOptions) -> ReliabilityResult<Grad>
where
    F: Fn(&Point) -> ReliabilityResult<f64> + Sync,
{
    let dim = u.len();
    let grad = match opts.steps(dim)? {
        None => {
            let closure_err: RefCell<Option<ReliabilityError>> = RefCell::new(None);
            let func = capture_scalar(f, &closure_err);
            let grad = match opts.scheme {
                DiffScheme::Forward => u.forward_diff(&func),
                DiffScheme::Central => u.central_diff(&func),
            };
            if let Some(err) = closure_err.take() {
                return Err(err);
            }
            grad
        }
        Some(h) => match opts.scheme {
            DiffScheme::Forward => {
                let mut points = Vec::with_capacity(dim + 1);
                points.push(u.clone());
                points.extend((0..dim).map(|i| shifted(u, &[(i, h[i])])));
                let values = eval_all(f, &points, opts.parallel)?;
                Grad::from_shape_fn(dim, |i| (values[i + 1] - values[0]) / h[i])
            }
            DiffScheme::Central => {
                let points: Vec<Point> = (0..dim)
                    .flat_map(|i| [shifted(u, &[(i, h[i])]), shifted(u, &[(i, -h[i])])])
                    .collect();
                let values = eval_all(f, &points, opts.parallel)?;
                Grad::from_shape_fn(dim, |i| {
                    (values[2 * i] - values[2 * i + 1]) / (2.0 * h[i])
                })
            }
        },
    };
    validate_grad(&grad, dim)?;
    Ok(grad)
}

/// fd_hessian_from_gradient — Hessian by differencing a gradient map.
///
/// Column `j` holds `∂g/∂u_j`. Adaptive steps try the `finitediff` central
/// Hessian first and fall back to its forward Hessian when the central
/// estimate fails validation; explicit steps use the configured scheme. The
/// result is symmetrized after validation.
///
/// Errors
/// ------
/// - Any error returned by `grad_fn`.
/// - `ReliabilityError::HessianDimMismatch` / `InvalidHessian` when the
///   estimate is malformed.
pub fn fd_hessian_from_gradient<F>(
    grad_fn: &F, u: &Point, opts: &FiniteDiffOptions,
) -> ReliabilityResult<Hessian>
where
    F: Fn(&Point) -> ReliabilityResult<Grad> + Sync,
{
    let dim = u.len();
    let mut hess = match opts.steps(dim)? {
        None => {
            let closure_err: RefCell<Option<ReliabilityError>> = RefCell::new(None);
            let func = capture_vector(grad_fn, dim, &closure_err);
            let cent_hess = u.central_hessian(&func);
            if let Some(err) = closure_err.take() {
                return Err(err);
            }
            match validate_hessian(&cent_hess, dim) {
                Ok(()) => cent_hess,
                Err(_) => {
                    let forward_hess = u.forward_hessian(&func);
                    if let Some(err) = closure_err.take() {
                        return Err(err);
                    }
                    forward_hess
                }
            }
        }
        Some(h) => {
            let mut hess = Array2::zeros((dim, dim));
            match opts.scheme {
                DiffScheme::Forward => {
                    let mut points = Vec::with_capacity(dim + 1);
                    points.push(u.clone());
                    points.extend((0..dim).map(|j| shifted(u, &[(j, h[j])])));
                    let grads = eval_all(grad_fn, &points, opts.parallel)?;
                    for j in 0..dim {
                        let column = (&grads[j + 1] - &grads[0]) / h[j];
                        hess.column_mut(j).assign(&column);
                    }
                }
                DiffScheme::Central => {
                    let points: Vec<Point> = (0..dim)
                        .flat_map(|j| [shifted(u, &[(j, h[j])]), shifted(u, &[(j, -h[j])])])
                        .collect();
                    let grads = eval_all(grad_fn, &points, opts.parallel)?;
                    for j in 0..dim {
                        let column = (&grads[2 * j] - &grads[2 * j + 1]) / (2.0 * h[j]);
                        hess.column_mut(j).assign(&column);
                    }
                }
            }
            hess
        }
    };
    validate_hessian(&hess, dim)?;
    symmetrize_hess(&mut hess);
    Ok(hess)
}

/// fd_hessian_from_values — Hessian from function values only.
///
/// Central stencil (per pair `i < j`, 4 evaluations; per diagonal, 2 plus the
/// shared centre):
/// - `H_ii = (f(u + hᵢeᵢ) − 2 f(u) + f(u − hᵢeᵢ)) / hᵢ²`
/// - `H_ij = (f(u + hᵢeᵢ + hⱼeⱼ) − f(u + hᵢeᵢ − hⱼeⱼ) − f(u − hᵢeᵢ + hⱼeⱼ)
///   + f(u − hᵢeᵢ − hⱼeⱼ)) / (4 hᵢ hⱼ)`
///
/// Forward stencil:
/// - `H_ii = (f(u + 2hᵢeᵢ) − 2 f(u + hᵢeᵢ) + f(u)) / hᵢ²`
/// - `H_ij = (f(u + hᵢeᵢ + hⱼeⱼ) − f(u + hᵢeᵢ) − f(u + hⱼeⱼ) + f(u)) / (hᵢ hⱼ)`
///
/// Adaptive steps are `hᵢ = ε^(1/4)·max(1, |uᵢ|)` for central stencils and
/// `ε^(1/3)·max(1, |uᵢ|)` for forward stencils, balancing truncation against
/// cancellation in second differences.
pub fn fd_hessian_from_values<F>(
    f: &F, u: &Point, opts: &FiniteDiffOptions,
) -> ReliabilityResult<Hessian>
where
    F: Fn(&Point) -> ReliabilityResult<f64> + Sync,
{
    let dim = u.len();
    let h = match opts.steps(dim)? {
        Some(h) => h,
        None => adaptive_second_order_steps(u, opts.scheme),
    };
    let mut hess = match opts.scheme {
        DiffScheme::Central => central_value_hessian(f, u, &h, opts.parallel)?,
        DiffScheme::Forward => forward_value_hessian(f, u, &h, opts.parallel)?,
    };
    validate_hessian(&hess, dim)?;
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

fn central_value_hessian<F>(
    f: &F, u: &Point, h: &Point, parallel: bool,
) -> ReliabilityResult<Hessian>
where
    F: Fn(&Point) -> ReliabilityResult<f64> + Sync,
{
    let n = u.len();
    let pairs = upper_pairs(n);
    let mut points = Vec::with_capacity(1 + 2 * n + 4 * pairs.len());
    points.push(u.clone());
    for i in 0..n {
        points.push(shifted(u, &[(i, h[i])]));
        points.push(shifted(u, &[(i, -h[i])]));
    }
    for &(i, j) in &pairs {
        points.push(shifted(u, &[(i, h[i]), (j, h[j])]));
        points.push(shifted(u, &[(i, h[i]), (j, -h[j])]));
        points.push(shifted(u, &[(i, -h[i]), (j, h[j])]));
        points.push(shifted(u, &[(i, -h[i]), (j, -h[j])]));
    }
    let values = eval_all(f, &points, parallel)?;

    let f0 = values[0];
    let mut hess = Array2::zeros((n, n));
    for i in 0..n {
        hess[[i, i]] = (values[1 + 2 * i] - 2.0 * f0 + values[2 + 2 * i]) / (h[i] * h[i]);
    }
    let offset = 1 + 2 * n;
    for (k, &(i, j)) in pairs.iter().enumerate() {
        let v = &values[offset + 4 * k..offset + 4 * k + 4];
        let mixed = (v[0] - v[1] - v[2] + v[3]) / (4.0 * h[i] * h[j]);
        hess[[i, j]] = mixed;
        hess[[j, i]] = mixed;
    }
    Ok(hess)
}

fn forward_value_hessian<F>(
    f: &F, u: &Point, h: &Point, parallel: bool,
) -> ReliabilityResult<Hessian>
where
    F: Fn(&Point) -> ReliabilityResult<f64> + Sync,
{
    let n = u.len();
    let pairs = upper_pairs(n);
    let mut points = Vec::with_capacity(1 + 2 * n + pairs.len());
    points.push(u.clone());
    for i in 0..n {
        points.push(shifted(u, &[(i, h[i])]));
        points.push(shifted(u, &[(i, 2.0 * h[i])]));
    }
    for &(i, j) in &pairs {
        points.push(shifted(u, &[(i, h[i]), (j, h[j])]));
    }
    let values = eval_all(f, &points, parallel)?;

    let f0 = values[0];
    let single = |i: usize| values[1 + 2 * i];
    let double = |i: usize| values[2 + 2 * i];
    let mut hess = Array2::zeros((n, n));
    for i in 0..n {
        hess[[i, i]] = (double(i) - 2.0 * single(i) + f0) / (h[i] * h[i]);
    }
    let offset = 1 + 2 * n;
    for (k, &(i, j)) in pairs.iter().enumerate() {
        let mixed = (values[offset + k] - single(i) - single(j) + f0) / (h[i] * h[j]);
        hess[[i, j]] = mixed;
        hess[[j, i]] = mixed;
    }
    Ok(hess)
}

/// Evaluate `f` at every stencil point, optionally on the rayon pool.
///
/// The first error (in stencil order for the sequential path, any error for
/// the parallel path) aborts the batch.
fn eval_all<F, R>(f: &F, points: &[Point], parallel: bool) -> ReliabilityResult<Vec<R>>
where
    F: Fn(&Point) -> ReliabilityResult<R> + Sync,
    R: Send,
{
    if parallel {
        points.par_iter().map(|p| f(p)).collect()
    } else {
        points.iter().map(|p| f(p)).collect()
    }
}

fn adaptive_second_order_steps(u: &Point, scheme: DiffScheme) -> Point {
    let base = match scheme {
        DiffScheme::Central => f64::EPSILON.powf(0.25),
        DiffScheme::Forward => f64::EPSILON.cbrt(),
    };
    u.mapv(|ui| base * ui.abs().max(1.0))
}

fn shifted(u: &Point, deltas: &[(usize, f64)]) -> Point {
    let mut p = u.clone();
    for &(i, d) in deltas {
        p[i] += d;
    }
    p
}

fn upper_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect()
}

/// Wrap a fallible scalar function for `finitediff`, parking the first error
/// in `slot` and returning `NaN` in its place.
fn capture_scalar<'a, F>(
    f: &'a F, slot: &'a RefCell<Option<ReliabilityError>>,
) -> impl Fn(&Point) -> f64 + 'a
where
    F: Fn(&Point) -> ReliabilityResult<f64>,
{
    move |u: &Point| match f(u) {
        Ok(value) => value,
        Err(e) => {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some(e);
            }
            f64::NAN
        }
    }
}

/// Vector-valued counterpart of [`capture_scalar`]; failed evaluations become
/// a `NaN`-filled vector of length `dim`.
fn capture_vector<'a, F>(
    f: &'a F, dim: usize, slot: &'a RefCell<Option<ReliabilityError>>,
) -> impl Fn(&Point) -> Grad + 'a
where
    F: Fn(&Point) -> ReliabilityResult<Grad>,
{
    move |u: &Point| match f(u) {
        Ok(grad) => grad,
        Err(e) => {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some(e);
            }
            Grad::from_elem(dim, f64::NAN)
        }
    }
}

/// symmetrize_hess — average each off-diagonal pair in place.
///
/// The diagonal is untouched. Called only after validation, so it performs
/// no shape or finiteness checks of its own.
pub(crate) fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivatives::options::StepSize;
    use ndarray::{array, Array1};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Explicit-step and adaptive gradients on smooth test functions.
    // - Hessians from gradients and from values, including mixed terms.
    // - Error capture from the model closure.
    // - Agreement between parallel and sequential stencil evaluation.
    //
    // They intentionally DO NOT cover:
    // - Space-transform conversions (handled in `model::adapter`).
    // -------------------------------------------------------------------------

    fn quadratic(u: &Point) -> ReliabilityResult<f64> {
        // f(u) = u0² + 3 u0 u1 + 2 u1²  →  ∇f = [2u0 + 3u1, 3u0 + 4u1], H = [[2, 3], [3, 4]]
        Ok(u[0] * u[0] + 3.0 * u[0] * u[1] + 2.0 * u[1] * u[1])
    }

    fn central(h: f64) -> FiniteDiffOptions {
        FiniteDiffOptions::new(DiffScheme::Central, StepSize::Uniform(h), false).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Central differences are exact (to rounding) on quadratics.
    //
    // Given
    // -----
    // - The quadratic above at u = [1, -2] with step 0.01.
    //
    // Expect
    // ------
    // - Gradient ≈ [2 - 6, 3 - 8] = [-4, -5] within 1e-9.
    fn central_gradient_is_exact_on_quadratic() {
        // Arrange
        let u = array![1.0, -2.0];

        // Act
        let grad = fd_gradient(&quadratic, &u, &central(0.01)).unwrap();

        // Assert
        assert!((grad[0] + 4.0).abs() < 1e-9);
        assert!((grad[1] + 5.0).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Forward differences carry an O(h) bias equal to (h/2)·H_ii.
    //
    // Given
    // -----
    // - The quadratic at u = [0, 0] with per-coordinate steps [0.1, 0.2].
    //
    // Expect
    // ------
    // - grad ≈ [0.5·0.1·2, 0.5·0.2·4] = [0.1, 0.4].
    fn forward_gradient_uses_per_coordinate_steps() {
        // Arrange
        let opts = FiniteDiffOptions::new(
            DiffScheme::Forward,
            StepSize::PerCoordinate(array![0.1, 0.2]),
            false,
        )
        .unwrap();

        // Act
        let grad = fd_gradient(&quadratic, &array![0.0, 0.0], &opts).unwrap();

        // Assert
        assert!((grad[0] - 0.1).abs() < 1e-12);
        assert!((grad[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn adaptive_gradient_matches_analytic() {
        let opts = FiniteDiffOptions::new(DiffScheme::Central, StepSize::Adaptive, false).unwrap();
        let grad = fd_gradient(&quadratic, &array![1.0, -2.0], &opts).unwrap();
        assert!((grad[0] + 4.0).abs() < 1e-6);
        assert!((grad[1] + 5.0).abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Model errors raised inside a finitediff closure are surfaced unchanged.
    //
    // Given
    // -----
    // - A model that fails with `NonFiniteValue` everywhere; adaptive steps.
    //
    // Expect
    // ------
    // - `fd_gradient` returns that error rather than a NaN gradient.
    fn adaptive_gradient_propagates_model_error() {
        // Arrange
        let failing = |_: &Point| -> ReliabilityResult<f64> {
            Err(ReliabilityError::NonFiniteValue { value: f64::INFINITY })
        };
        let opts = FiniteDiffOptions::new(DiffScheme::Forward, StepSize::Adaptive, false).unwrap();

        // Act
        let err = fd_gradient(&failing, &array![0.5], &opts).unwrap_err();

        // Assert
        assert!(matches!(err, ReliabilityError::NonFiniteValue { .. }));
    }

    #[test]
    fn explicit_gradient_propagates_model_error() {
        let failing = |u: &Point| -> ReliabilityResult<f64> {
            if u[0] > 0.0 {
                Err(ReliabilityError::NonFiniteValue { value: f64::NAN })
            } else {
                Ok(0.0)
            }
        };
        let err = fd_gradient(&failing, &array![0.0], &central(0.01)).unwrap_err();
        assert!(matches!(err, ReliabilityError::NonFiniteValue { .. }));
    }

    #[test]
    fn non_finite_values_yield_invalid_gradient() {
        let nan_model = |_: &Point| -> ReliabilityResult<f64> { Ok(f64::NAN) };
        let err = fd_gradient(&nan_model, &array![0.0, 1.0], &central(0.01)).unwrap_err();
        assert!(matches!(err, ReliabilityError::InvalidGradient { .. }));
    }

    #[test]
    // Purpose
    // -------
    // The value-only central stencil recovers diagonal and mixed terms.
    //
    // Given
    // -----
    // - The quadratic with H = [[2, 3], [3, 4]] at u = [0.3, 0.7].
    //
    // Expect
    // ------
    // - Central and forward value Hessians match H within 1e-6; both are
    //   exactly symmetric.
    fn value_hessians_recover_mixed_terms() {
        // Arrange
        let u = array![0.3, 0.7];
        let forward =
            FiniteDiffOptions::new(DiffScheme::Forward, StepSize::Uniform(1e-3), false).unwrap();

        // Act
        let h_central = fd_hessian_from_values(&quadratic, &u, &central(0.01)).unwrap();
        let h_forward = fd_hessian_from_values(&quadratic, &u, &forward).unwrap();

        // Assert
        let expected = array![[2.0, 3.0], [3.0, 4.0]];
        for h in [&h_central, &h_forward] {
            assert!((h - &expected).iter().all(|d| d.abs() < 1e-6), "got {h:?}");
            assert_eq!(h[[0, 1]], h[[1, 0]]);
        }
    }

    #[test]
    fn adaptive_value_hessian_is_close() {
        let expected = array![[2.0, 3.0], [3.0, 4.0]];
        for scheme in [DiffScheme::Central, DiffScheme::Forward] {
            let opts = FiniteDiffOptions::new(scheme, StepSize::Adaptive, false).unwrap();
            let h = fd_hessian_from_values(&quadratic, &array![0.3, 0.7], &opts).unwrap();
            assert!((&h - &expected).iter().all(|d| d.abs() < 1e-3), "got {h:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Differencing an exact gradient yields the Hessian for both step modes.
    //
    // Given
    // -----
    // - g(u) = [2u0 + 3u1, 3u0 + 4u1] at u = [1, 2].
    //
    // Expect
    // ------
    // - H = [[2, 3], [3, 4]] within tolerance for explicit and adaptive steps.
    fn gradient_hessian_recovers_matrix() {
        // Arrange
        let grad_fn = |u: &Point| -> ReliabilityResult<Grad> {
            Ok(array![2.0 * u[0] + 3.0 * u[1], 3.0 * u[0] + 4.0 * u[1]])
        };
        let u = array![1.0, 2.0];
        let adaptive =
            FiniteDiffOptions::new(DiffScheme::Central, StepSize::Adaptive, false).unwrap();

        // Act
        let h_explicit = fd_hessian_from_gradient(&grad_fn, &u, &central(0.01)).unwrap();
        let h_adaptive = fd_hessian_from_gradient(&grad_fn, &u, &adaptive).unwrap();

        // Assert
        let expected = array![[2.0, 3.0], [3.0, 4.0]];
        assert!((&h_explicit - &expected).iter().all(|d| d.abs() < 1e-9));
        assert!((&h_adaptive - &expected).iter().all(|d| d.abs() < 1e-5));
    }

    #[test]
    fn gradient_hessian_rejects_nan_gradients() {
        let grad_fn = |_: &Point| -> ReliabilityResult<Grad> { Ok(Array1::from(vec![f64::NAN])) };
        let err = fd_hessian_from_gradient(&grad_fn, &array![0.0], &central(0.01)).unwrap_err();
        assert!(matches!(err, ReliabilityError::InvalidHessian { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Parallel stencil evaluation is bitwise identical to sequential.
    //
    // Given
    // -----
    // - A smooth non-polynomial function in ℝ⁴ and central steps 0.05.
    //
    // Expect
    // ------
    // - Gradients and value Hessians are equal element for element.
    fn parallel_and_sequential_stencils_agree() {
        // Arrange
        let f = |u: &Point| -> ReliabilityResult<f64> {
            Ok(u.iter().enumerate().map(|(i, x)| (x * (i as f64 + 1.0)).sin()).sum::<f64>()
                + u[0] * u[3])
        };
        let u = array![0.1, -0.4, 0.9, 1.3];
        let seq = central(0.05);
        let par = FiniteDiffOptions { parallel: true, ..seq.clone() };

        // Act
        let g_seq = fd_gradient(&f, &u, &seq).unwrap();
        let g_par = fd_gradient(&f, &u, &par).unwrap();
        let h_seq = fd_hessian_from_values(&f, &u, &seq).unwrap();
        let h_par = fd_hessian_from_values(&f, &u, &par).unwrap();

        // Assert
        assert_eq!(g_seq, g_par);
        assert_eq!(h_seq, h_par);
    }

    #[test]
    fn symmetrize_hess_makes_matrix_symmetric() {
        let mut h: Hessian = Array2::from_shape_vec((2, 2), vec![1.0_f64, 2.0, 0.0, 3.0]).unwrap();
        symmetrize_hess(&mut h);
        assert_eq!(h, array![[1.0, 1.0], [1.0, 3.0]]);
    }
}

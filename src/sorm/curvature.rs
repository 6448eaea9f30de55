//! sorm::curvature — principal curvatures of the limit-state surface at `U*`.
//!
//! Purpose
//! -------
//! Turn the Hessian of `G` at the design point into the `n − 1` principal
//! curvatures of the surface `G = 0` there.
//!
//! Key behaviors
//! -------------
//! - Build a Householder reflection `P = I − 2 v vᵀ / (vᵀ v)` with
//!   `v = a + sign(a_n) e_n`, `a = ∇G / ‖∇G‖`, which maps the gradient
//!   direction onto the last axis. Unlike Gram–Schmidt on a fixed basis it
//!   never breaks down when `a` is orthogonal to that axis.
//! - Form `A = P H P / ‖∇G‖`, drop the gradient row/column, and take the
//!   eigenvalues of the remaining `(n − 1) × (n − 1)` block with `nalgebra`'s
//!   `symmetric_eigen`.
//!
//! Conventions
//! -----------
//! - Positive curvature means the failure domain (`G < 0`) bends away from
//!   the origin, so the first-order estimate is conservative. A sphere of
//!   radius `r` enclosing the failure domain has `κ_i = 1/r`.
//! - Curvatures are returned sorted ascending; magnitudes at most
//!   `EIGEN_EPS` are reported as exactly zero.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    form::state::DesignPoint,
    model::{
        types::{Grad, Hessian},
        validation::validate_hessian,
    },
    numerics::{l2_norm, DEGENERACY_EPS, EIGEN_EPS},
};

/// principal_curvatures — `κ_1 ≤ … ≤ κ_{n−1}` at the design point.
///
/// Parameters
/// ----------
/// - `design`: FORM design point; only its gradient and iteration count are
///   read.
/// - `hessian`: symmetric `n × n` Hessian of `G` in standard normal space at
///   `design.point`.
///
/// Returns
/// -------
/// A length-`n − 1` vector; empty when `n = 1`.
///
/// Errors
/// ------
/// - `ReliabilityError::HessianDimMismatch` / `InvalidHessian` for malformed
///   input.
/// - `ReliabilityError::NumericalDegeneracy` when `‖∇G(U*)‖` vanishes.
pub fn principal_curvatures(
    design: &DesignPoint, hessian: &Hessian,
) -> ReliabilityResult<Array1<f64>> {
    let n = design.gradient.len();
    validate_hessian(hessian, n)?;
    let grad_norm = l2_norm(&design.gradient);
    if grad_norm <= DEGENERACY_EPS {
        return Err(ReliabilityError::NumericalDegeneracy {
            iteration: design.status.iterations,
            grad_norm,
        });
    }
    if n == 1 {
        return Ok(Array1::zeros(0));
    }

    let rotation = householder_rotation(&(&design.gradient / grad_norm));
    let rotated = rotation.dot(hessian).dot(&rotation) / grad_norm;

    let m = n - 1;
    let mut block = DMatrix::<f64>::zeros(m, m);
    fill_dmatrix(&rotated, &mut block);
    let eigen = block.symmetric_eigen();
    let mut curvatures: Vec<f64> = eigen
        .eigenvalues
        .iter()
        .map(|&k| if k.abs() <= EIGEN_EPS { 0.0 } else { k })
        .collect();
    curvatures.sort_by(f64::total_cmp);
    Ok(Array1::from(curvatures))
}

// ---- Helper methods ----

/// Householder reflection mapping the unit vector `a` to `∓e_n`.
fn householder_rotation(a: &Grad) -> Array2<f64> {
    let n = a.len();
    let last = n - 1;
    let sign = if a[last] < 0.0 { -1.0 } else { 1.0 };
    let mut v = a.clone();
    v[last] += sign;
    let vtv = v.dot(&v);
    Array2::from_shape_fn((n, n), |(i, j)| {
        let delta = if i == j { 1.0 } else { 0.0 };
        delta - 2.0 * v[i] * v[j] / vtv
    })
}

/// Copy the leading `m × m` block of `src` into `dst` (column-major writes).
fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    let m = dst.nrows();
    for j in 0..m {
        for i in 0..m {
            dst[(i, j)] = src[[i, j]];
        }
    }
}

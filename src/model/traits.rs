//! Public model interfaces consumed by FORM and SORM.
//!
//! - [`PerformanceFunction`]: the limit-state function `G(x)`; failure is `G < 0`.
//! - [`SpaceTransform`]: the bidirectional map between physical space `x` and
//!   uncorrelated standard normal space `u`.
//!
//! Convention: `G` is evaluated in **physical** space. Problems already posed in
//! `u`-space pair their performance function with
//! [`IdentityTransform`](crate::model::transforms::IdentityTransform).
use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    model::types::{Grad, Hessian, Jacobian, Point},
};

/// User-implemented performance (limit-state) function.
///
/// Required:
/// - `value(&Point) -> ReliabilityResult<f64>`: evaluate `G(x)`.
///
/// Optional:
/// - `gradient(&Point)`: analytical `∇ₓG(x)`. Advertise it by returning `true`
///   from [`has_gradient`](PerformanceFunction::has_gradient).
/// - `hessian(&Point)`: analytical `∇ₓ²G(x)`, advertised by
///   [`has_hessian`](PerformanceFunction::has_hessian).
///
/// Capability flags are read once per analysis to pick the derivative
/// strategy; they are never re-checked inside the iteration loop.
///
/// The `Sync` bound lets finite-difference stencils and multi-start runs
/// evaluate the function from several threads.
pub trait PerformanceFunction: Sync {
    // Required methods
    fn value(&self, x: &Point) -> ReliabilityResult<f64>;

    // Optional methods
    fn gradient(&self, _x: &Point) -> ReliabilityResult<Grad> {
        Err(ReliabilityError::GradientNotImplemented)
    }

    fn hessian(&self, _x: &Point) -> ReliabilityResult<Hessian> {
        Err(ReliabilityError::HessianNotImplemented)
    }

    fn has_gradient(&self) -> bool {
        false
    }

    fn has_hessian(&self) -> bool {
        false
    }
}

/// Map between physical space and standard normal space.
///
/// - `to_standard_normal(x) -> u` and `to_physical(u) -> x` must be mutual
///   inverses on the support of the random vector.
/// - `jacobian(u)` returns `J = ∂x/∂u` evaluated at `u`; it is used to convert
///   analytical physical-space gradients via `∇ᵤG = Jᵀ ∇ₓG`.
/// - `is_affine()` reports whether `J` is constant, which is what makes the
///   Hessian conversion `Jᵀ Hₓ J` exact.
pub trait SpaceTransform: Sync {
    fn dim(&self) -> usize;
    fn to_standard_normal(&self, x: &Point) -> ReliabilityResult<Point>;
    fn to_physical(&self, u: &Point) -> ReliabilityResult<Point>;
    fn jacobian(&self, u: &Point) -> ReliabilityResult<Jacobian>;

    fn is_affine(&self) -> bool {
        false
    }
}

impl<G: PerformanceFunction + ?Sized> PerformanceFunction for &G {
    fn value(&self, x: &Point) -> ReliabilityResult<f64> {
        (**self).value(x)
    }

    fn gradient(&self, x: &Point) -> ReliabilityResult<Grad> {
        (**self).gradient(x)
    }

    fn hessian(&self, x: &Point) -> ReliabilityResult<Hessian> {
        (**self).hessian(x)
    }

    fn has_gradient(&self) -> bool {
        (**self).has_gradient()
    }

    fn has_hessian(&self) -> bool {
        (**self).has_hessian()
    }
}

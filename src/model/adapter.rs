//! Adapter that exposes `G ∘ T` in standard normal space as an `argmin` problem.
//!
//! The performance function lives in physical space; the HLRF solver works in
//! `u`-space. [`StandardSpaceModel`] evaluates `G(T(u))` and its gradient,
//! converting analytical physical-space gradients with `∇ᵤG = Jᵀ ∇ₓG` or
//! finite-differencing the composed map, according to a [`GradientSource`]
//! fixed at construction.
use argmin::core::{CostFunction, Error, Gradient};

use crate::{
    derivatives::{
        finite_diff::{fd_gradient, fd_hessian_from_gradient, fd_hessian_from_values},
        options::{DerivativeMode, FiniteDiffOptions},
        strategy::{resolve_gradient_source, resolve_hessian_source, GradientSource, HessianSource},
    },
    errors::{ReliabilityError, ReliabilityResult},
    model::{
        traits::{PerformanceFunction, SpaceTransform},
        types::{Grad, Hessian, Point},
        validation::{
            validate_grad, validate_hessian, validate_jacobian, validate_point, validate_value,
        },
    },
};

/// Bridges a [`PerformanceFunction`] and a [`SpaceTransform`] to `argmin`'s
/// `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `G(T(u))`.
/// - `Gradient::gradient` returns `∇ᵤG(u)` from the resolved source.
#[derive(Debug)]
pub struct StandardSpaceModel<'a, G, T> {
    g: &'a G,
    transform: &'a T,
    gradient: GradientSource,
    dim: usize,
}

impl<'a, G, T> StandardSpaceModel<'a, G, T>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    /// Bind `g` and `transform` and resolve the gradient strategy once.
    ///
    /// # Errors
    /// - [`ReliabilityError::EmptyDimension`] if the transform has `dim() == 0`.
    /// - [`ReliabilityError::MissingCapability`] for an unsatisfiable
    ///   analytical request.
    /// - Finite-difference step errors for the transform dimension.
    pub fn new(
        g: &'a G, transform: &'a T, mode: DerivativeMode, fd: &FiniteDiffOptions,
    ) -> ReliabilityResult<Self> {
        let dim = transform.dim();
        if dim == 0 {
            return Err(ReliabilityError::EmptyDimension);
        }
        let gradient = resolve_gradient_source(mode, fd, g.has_gradient(), dim)?;
        Ok(Self { g, transform, gradient, dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn gradient_source(&self) -> &GradientSource {
        &self.gradient
    }

    /// Map a standard normal point to physical space.
    pub fn to_physical(&self, u: &Point) -> ReliabilityResult<Point> {
        validate_point(u, self.dim)?;
        self.transform.to_physical(u)
    }

    /// Map a physical point to standard normal space.
    pub fn to_standard_normal(&self, x: &Point) -> ReliabilityResult<Point> {
        validate_point(x, self.dim)?;
        let u = self.transform.to_standard_normal(x)?;
        validate_point(&u, self.dim)?;
        Ok(u)
    }

    /// Evaluate `G(T(u))`, rejecting non-finite values.
    pub fn value_at(&self, u: &Point) -> ReliabilityResult<f64> {
        let x = self.to_physical(u)?;
        let value = self.g.value(&x)?;
        validate_value(value)?;
        Ok(value)
    }

    /// Evaluate `∇ᵤG(u)` from the resolved gradient source.
    pub fn gradient_at(&self, u: &Point) -> ReliabilityResult<Grad> {
        match &self.gradient {
            GradientSource::Analytical => self.analytical_gradient_at(u),
            GradientSource::FiniteDifference(opts) => {
                validate_point(u, self.dim)?;
                fd_gradient(&|p: &Point| self.value_at(p), u, opts)
            }
        }
    }

    /// Resolve the Hessian strategy for this model under `mode`.
    ///
    /// # Errors
    /// See [`resolve_hessian_source`].
    pub fn resolve_hessian(
        &self, mode: DerivativeMode, fd: &FiniteDiffOptions,
    ) -> ReliabilityResult<HessianSource> {
        resolve_hessian_source(
            mode,
            fd,
            self.g.has_hessian(),
            self.g.has_gradient(),
            self.transform.is_affine(),
            self.dim,
        )
    }

    /// Evaluate `∇ᵤ²G(u)` from `source`.
    ///
    /// - `Analytical`: `Jᵀ Hₓ J` (exact for affine transforms only; the
    ///   strategy resolver guarantees that).
    /// - `FromGradient`: differences of the converted analytical gradient.
    /// - `FromValues`: second-order differences of `G(T(u))`.
    ///
    /// The returned matrix is validated and symmetric.
    pub fn hessian_at(&self, u: &Point, source: &HessianSource) -> ReliabilityResult<Hessian> {
        validate_point(u, self.dim)?;
        match source {
            HessianSource::Analytical => {
                let x = self.transform.to_physical(u)?;
                let hess_x = self.g.hessian(&x)?;
                validate_hessian(&hess_x, self.dim)?;
                let jac = self.transform.jacobian(u)?;
                validate_jacobian(&jac, self.dim)?;
                let hess_u = jac.t().dot(&hess_x).dot(&jac);
                let hess_u = 0.5 * (&hess_u + &hess_u.t());
                validate_hessian(&hess_u, self.dim)?;
                Ok(hess_u)
            }
            HessianSource::FromGradient(opts) => {
                fd_hessian_from_gradient(&|p: &Point| self.analytical_gradient_at(p), u, opts)
            }
            HessianSource::FromValues(opts) => {
                fd_hessian_from_values(&|p: &Point| self.value_at(p), u, opts)
            }
        }
    }

    // ---- Helper methods ----

    fn analytical_gradient_at(&self, u: &Point) -> ReliabilityResult<Grad> {
        let x = self.to_physical(u)?;
        let grad_x = self.g.gradient(&x)?;
        validate_grad(&grad_x, self.dim)?;
        let jac = self.transform.jacobian(u)?;
        validate_jacobian(&jac, self.dim)?;
        let grad_u = jac.t().dot(&grad_x);
        validate_grad(&grad_u, self.dim)?;
        Ok(grad_u)
    }
}

impl<G, T> Clone for StandardSpaceModel<'_, G, T> {
    fn clone(&self) -> Self {
        Self {
            g: self.g,
            transform: self.transform,
            gradient: self.gradient.clone(),
            dim: self.dim,
        }
    }
}

impl<'a, G, T> CostFunction for StandardSpaceModel<'a, G, T>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    type Param = Point;
    type Output = f64;

    fn cost(&self, u: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.value_at(u)?)
    }
}

impl<'a, G, T> Gradient for StandardSpaceModel<'a, G, T>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    type Param = Point;
    type Gradient = Grad;

    fn gradient(&self, u: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.gradient_at(u)?)
    }
}

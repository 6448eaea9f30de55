//! Capability-based derivative strategy, resolved once per analysis.
//!
//! FORM and SORM never inspect capability flags inside their loops; they read
//! a [`GradientSource`] / [`HessianSource`] chosen here from the requested
//! [`DerivativeMode`], the performance function's `has_gradient` /
//! `has_hessian` flags, and whether the space transform is affine.
use crate::{
    derivatives::options::{DerivativeMode, FiniteDiffOptions},
    errors::{ReliabilityError, ReliabilityResult},
};

/// Where gradients in standard normal space come from.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientSource {
    /// `∇ᵤG = Jᵀ ∇ₓG` from the analytical physical-space gradient.
    Analytical,
    /// Finite differences of `G(T(u))`.
    FiniteDifference(FiniteDiffOptions),
}

/// Where Hessians in standard normal space come from.
#[derive(Debug, Clone, PartialEq)]
pub enum HessianSource {
    /// `Jᵀ Hₓ J`; only exact for affine transforms.
    Analytical,
    /// Differences of the converted analytical gradient, symmetrized.
    FromGradient(FiniteDiffOptions),
    /// Second-order differences of values only.
    FromValues(FiniteDiffOptions),
}

/// resolve_gradient_source — pick the gradient path for one analysis.
///
/// - `Auto`: analytical when `has_gradient`, else finite differences.
/// - `Analytical`: requires `has_gradient`.
/// - `FiniteDifference`: always finite differences.
///
/// # Errors
/// - [`ReliabilityError::MissingCapability`] when `Analytical` is requested
///   from a performance function without a gradient.
/// - Step-resolution errors from [`FiniteDiffOptions::steps`] for `dim`.
pub fn resolve_gradient_source(
    mode: DerivativeMode, fd: &FiniteDiffOptions, has_gradient: bool, dim: usize,
) -> ReliabilityResult<GradientSource> {
    let use_analytical = match mode {
        DerivativeMode::Auto => has_gradient,
        DerivativeMode::Analytical if !has_gradient => {
            return Err(ReliabilityError::MissingCapability {
                capability: "gradient",
                reason: "Analytical gradients were requested but the performance function does not provide one.",
            });
        }
        DerivativeMode::Analytical => true,
        DerivativeMode::FiniteDifference => false,
    };
    if use_analytical {
        Ok(GradientSource::Analytical)
    } else {
        fd.steps(dim)?;
        Ok(GradientSource::FiniteDifference(fd.clone()))
    }
}

/// resolve_hessian_source — pick the Hessian path for one SORM correction.
///
/// - `Auto`: analytical when `has_hessian` and the transform is affine;
///   otherwise differences of the analytical gradient when `has_gradient`;
///   otherwise value-only differences.
/// - `Analytical`: requires `has_hessian` and an affine transform.
/// - `FiniteDifference`: gradient differences when `has_gradient`, else
///   value-only differences.
///
/// # Errors
/// - [`ReliabilityError::MissingCapability`] for an unsatisfiable
///   `Analytical` request.
/// - Step-resolution errors from [`FiniteDiffOptions::steps`] for `dim`.
pub fn resolve_hessian_source(
    mode: DerivativeMode, fd: &FiniteDiffOptions, has_hessian: bool, has_gradient: bool,
    affine: bool, dim: usize,
) -> ReliabilityResult<HessianSource> {
    match mode {
        DerivativeMode::Analytical => {
            if !has_hessian {
                return Err(ReliabilityError::MissingCapability {
                    capability: "hessian",
                    reason: "Analytical Hessians were requested but the performance function does not provide one.",
                });
            }
            if !affine {
                return Err(ReliabilityError::MissingCapability {
                    capability: "affine transform",
                    reason: "Converting an analytical Hessian requires a constant transform Jacobian.",
                });
            }
            Ok(HessianSource::Analytical)
        }
        DerivativeMode::Auto if has_hessian && affine => Ok(HessianSource::Analytical),
        DerivativeMode::Auto | DerivativeMode::FiniteDifference => {
            fd.steps(dim)?;
            if has_gradient {
                Ok(HessianSource::FromGradient(fd.clone()))
            } else {
                Ok(HessianSource::FromValues(fd.clone()))
            }
        }
    }
}

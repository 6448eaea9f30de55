//! Gradient and Hessian estimation in standard normal space.
pub mod finite_diff;
pub mod options;
pub mod strategy;

pub use self::{
    finite_diff::{fd_gradient, fd_hessian_from_gradient, fd_hessian_from_values},
    options::{DerivativeMode, DiffScheme, FiniteDiffOptions, StepSize, DEFAULT_FD_STEP},
    strategy::{resolve_gradient_source, resolve_hessian_source, GradientSource, HessianSource},
};

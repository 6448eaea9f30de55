//! Stock performance functions.
//!
//! - [`FnPerformance`] wraps a plain closure `Fn(&Point) -> f64`; derivatives
//!   come from finite differences.
//! - [`LinearPerformance`] is the hyperplane `G(x) = a·x + b` with analytical
//!   gradient and (zero) Hessian. FORM is exact on it, which makes it the
//!   reference case for solver checks.
use std::fmt;

use ndarray::Array2;

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    model::{
        traits::PerformanceFunction,
        types::{Grad, Hessian, Point},
        validation::validate_dim,
    },
};

/// Closure-backed performance function without analytical derivatives.
#[derive(Clone)]
pub struct FnPerformance<F> {
    f: F,
}

impl<F> fmt::Debug for FnPerformance<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPerformance").finish_non_exhaustive()
    }
}

impl<F> FnPerformance<F>
where
    F: Fn(&Point) -> f64 + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PerformanceFunction for FnPerformance<F>
where
    F: Fn(&Point) -> f64 + Sync,
{
    fn value(&self, x: &Point) -> ReliabilityResult<f64> {
        Ok((self.f)(x))
    }
}

/// Linear limit state `G(x) = a·x + b`.
///
/// The design point in `u`-space (identity transform) is
/// `u* = -(b / ‖a‖²)·a` with `β = ‖u*‖ = |b| / ‖a‖`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPerformance {
    coefficients: Grad,
    intercept: f64,
}

impl LinearPerformance {
    /// Build `G(x) = a·x + b`.
    ///
    /// # Errors
    /// - [`ReliabilityError::EmptyDimension`] if `a` is empty.
    /// - [`ReliabilityError::InvalidGradient`] if any coefficient is non-finite.
    /// - [`ReliabilityError::NonFiniteValue`] if `b` is non-finite.
    pub fn new(coefficients: Grad, intercept: f64) -> ReliabilityResult<Self> {
        if coefficients.is_empty() {
            return Err(ReliabilityError::EmptyDimension);
        }
        for (index, &value) in coefficients.iter().enumerate() {
            if !value.is_finite() {
                return Err(ReliabilityError::InvalidGradient {
                    index,
                    value,
                    reason: "Linear coefficients must be finite.",
                });
            }
        }
        if !intercept.is_finite() {
            return Err(ReliabilityError::NonFiniteValue { value: intercept });
        }
        Ok(Self { coefficients, intercept })
    }

    pub fn coefficients(&self) -> &Grad {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl PerformanceFunction for LinearPerformance {
    fn value(&self, x: &Point) -> ReliabilityResult<f64> {
        validate_dim(x, self.coefficients.len())?;
        Ok(self.coefficients.dot(x) + self.intercept)
    }

    fn gradient(&self, x: &Point) -> ReliabilityResult<Grad> {
        validate_dim(x, self.coefficients.len())?;
        Ok(self.coefficients.clone())
    }

    fn hessian(&self, x: &Point) -> ReliabilityResult<Hessian> {
        let n = self.coefficients.len();
        validate_dim(x, n)?;
        Ok(Array2::zeros((n, n)))
    }

    fn has_gradient(&self) -> bool {
        true
    }

    fn has_hessian(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // `LinearPerformance` evaluates `a·x + b` and reports its constant gradient.
    //
    // Given
    // -----
    // - `G(x) = 3·x1 + 4·x2 - 10`.
    //
    // Expect
    // ------
    // - `G([1.2, 1.6]) = 0` (the design point lies on the limit state).
    // - The gradient equals `[3, 4]` everywhere.
    fn linear_performance_evaluates_plane() {
        // Arrange
        let g = LinearPerformance::new(array![3.0, 4.0], -10.0).unwrap();

        // Act
        let value = g.value(&array![1.2, 1.6]).unwrap();
        let grad = g.gradient(&array![-5.0, 7.0]).unwrap();

        // Assert
        assert!(value.abs() < 1e-12);
        assert_eq!(grad, array![3.0, 4.0]);
        assert!(g.has_gradient() && g.has_hessian());
    }

    #[test]
    fn linear_performance_rejects_wrong_dimension() {
        let g = LinearPerformance::new(array![1.0, 1.0], 0.0).unwrap();
        let err = g.value(&array![1.0]).expect_err("length-1 point must be rejected");
        assert_eq!(err, ReliabilityError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn linear_performance_rejects_non_finite_coefficients() {
        let err = LinearPerformance::new(array![f64::NAN], 1.0).unwrap_err();
        assert!(matches!(err, ReliabilityError::InvalidGradient { index: 0, .. }));
    }

    #[test]
    fn fn_performance_has_no_analytical_derivatives() {
        let g = FnPerformance::new(|x: &Point| x.sum());
        assert_eq!(g.value(&array![1.0, 2.0]).unwrap(), 3.0);
        assert!(!g.has_gradient());
        assert_eq!(g.gradient(&array![1.0]).unwrap_err(), ReliabilityError::GradientNotImplemented);
    }

    #[test]
    fn fn_performance_debug_hides_the_closure() {
        let g = FnPerformance::new(|x: &Point| x[0]);
        assert_eq!(format!("{g:?}"), "FnPerformance { .. }");
    }
}

//! Validation helpers for points, model outputs, and derivatives.
//!
//! - **Dimension checks**: [`validate_dim`] compares a point against the
//!   problem dimension.
//! - **Finiteness checks**: [`validate_point`], [`validate_value`],
//!   [`validate_grad`], [`validate_hessian`], [`validate_jacobian`] reject NaN
//!   and ±∞ with the index of the first offending entry.
//!
//! Every helper returns a domain-specific [`ReliabilityError`] so that model
//! failures surface uniformly regardless of where they were detected.
use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    model::types::{Grad, Hessian, Jacobian, Point},
};

/// Check that `point.len() == dim`.
///
/// # Errors
/// [`ReliabilityError::DimensionMismatch`] on length mismatch.
pub fn validate_dim(point: &Point, dim: usize) -> ReliabilityResult<()> {
    if point.len() != dim {
        return Err(ReliabilityError::DimensionMismatch { expected: dim, found: point.len() });
    }
    Ok(())
}

/// Check length and finiteness of a point.
///
/// # Errors
/// - [`ReliabilityError::DimensionMismatch`] on length mismatch.
/// - [`ReliabilityError::InvalidPoint`] for the first non-finite coordinate.
pub fn validate_point(point: &Point, dim: usize) -> ReliabilityResult<()> {
    validate_dim(point, dim)?;
    for (index, &value) in point.iter().enumerate() {
        if !value.is_finite() {
            return Err(ReliabilityError::InvalidPoint {
                index,
                value,
                reason: "Point coordinates must be finite.",
            });
        }
    }
    Ok(())
}

/// Check that a performance-function value is finite.
///
/// # Errors
/// [`ReliabilityError::NonFiniteValue`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> ReliabilityResult<()> {
    if !value.is_finite() {
        return Err(ReliabilityError::NonFiniteValue { value });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`ReliabilityError::GradientDimMismatch`] if length does not match `dim`.
/// - [`ReliabilityError::InvalidGradient`] with the index/value of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> ReliabilityResult<()> {
    if grad.len() != dim {
        return Err(ReliabilityError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(ReliabilityError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate the shape and entries of a Hessian matrix.
///
/// # Errors
/// - [`ReliabilityError::HessianDimMismatch`] if the matrix is not `dim × dim`.
/// - [`ReliabilityError::InvalidHessian`] for the first non-finite entry.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> ReliabilityResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(ReliabilityError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(ReliabilityError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}

/// Validate the shape and entries of a transform Jacobian.
///
/// # Errors
/// - [`ReliabilityError::JacobianDimMismatch`] if the matrix is not `dim × dim`.
/// - [`ReliabilityError::SingularTransform`] if any entry is non-finite.
pub fn validate_jacobian(jacobian: &Jacobian, dim: usize) -> ReliabilityResult<()> {
    if jacobian.nrows() != dim || jacobian.ncols() != dim {
        return Err(ReliabilityError::JacobianDimMismatch {
            expected: dim,
            found: (jacobian.nrows(), jacobian.ncols()),
        });
    }
    if jacobian.iter().any(|v| !v.is_finite()) {
        return Err(ReliabilityError::SingularTransform);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn validate_point_reports_first_non_finite_coordinate() {
        let err = validate_point(&array![0.0, f64::INFINITY, f64::NAN], 3).unwrap_err();
        match err {
            ReliabilityError::InvalidPoint { index, .. } => assert_eq!(index, 1),
            other => panic!("Expected InvalidPoint, got {other:?}"),
        }
    }

    #[test]
    fn validate_grad_checks_dimension_before_entries() {
        let err = validate_grad(&array![f64::NAN], 2).unwrap_err();
        assert_eq!(err, ReliabilityError::GradientDimMismatch { expected: 2, found: 1 });
    }

    #[test]
    // Purpose
    // -------
    // Hessian validation covers both shape and finiteness.
    //
    // Given
    // -----
    // - A 2×3 matrix and a 2×2 matrix with a NaN at (1, 0).
    //
    // Expect
    // ------
    // - `HessianDimMismatch` for the first, `InvalidHessian { row: 1, col: 0 }`
    //   for the second.
    fn validate_hessian_rejects_shape_and_nan() {
        // Arrange
        let wrong_shape = Array2::<f64>::zeros((2, 3));
        let with_nan = array![[1.0, 0.0], [f64::NAN, 1.0]];

        // Act
        let shape_err = validate_hessian(&wrong_shape, 2).unwrap_err();
        let nan_err = validate_hessian(&with_nan, 2).unwrap_err();

        // Assert
        assert_eq!(shape_err, ReliabilityError::HessianDimMismatch { expected: 2, found: (2, 3) });
        assert!(matches!(nan_err, ReliabilityError::InvalidHessian { row: 1, col: 0, .. }));
    }

    #[test]
    fn validate_value_rejects_nan() {
        assert!(validate_value(-3.5).is_ok());
        assert!(matches!(validate_value(f64::NAN), Err(ReliabilityError::NonFiniteValue { .. })));
    }
}

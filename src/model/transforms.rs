//! model::transforms — linear space transforms.
//!
//! Purpose
//! -------
//! Provide the two transforms every reliability workflow needs without a
//! distribution layer: the identity (problems already posed in standard
//! normal space) and a general affine map `x = m + A u`.
//!
//! Key behaviors
//! -------------
//! - [`IdentityTransform`] returns its input unchanged and reports `J = I`.
//! - [`AffineTransform`] precomputes `A⁻¹` once (via `nalgebra`) so that
//!   `to_standard_normal` is a single mat-vec product.
//! - Both transforms report `is_affine() == true`, which enables exact
//!   analytical-Hessian conversion in the adapter.
//!
//! Invariants & assumptions
//! ------------------------
//! - `A` is square, finite, and invertible; this is checked at construction.
//! - Independent normal marginals map to a diagonal `A = diag(σ)` with
//!   `m = μ`; correlated Gaussian vectors can pass a Cholesky factor as `A`.
use nalgebra::DMatrix;
use ndarray::Array2;

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    model::{
        traits::SpaceTransform,
        types::{Jacobian, Point},
        validation::{validate_dim, validate_point},
    },
};

/// Identity map between `x` and `u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityTransform {
    dim: usize,
}

impl IdentityTransform {
    /// # Errors
    /// [`ReliabilityError::EmptyDimension`] if `dim == 0`.
    pub fn new(dim: usize) -> ReliabilityResult<Self> {
        if dim == 0 {
            return Err(ReliabilityError::EmptyDimension);
        }
        Ok(Self { dim })
    }
}

impl SpaceTransform for IdentityTransform {
    fn dim(&self) -> usize {
        self.dim
    }

    fn to_standard_normal(&self, x: &Point) -> ReliabilityResult<Point> {
        validate_dim(x, self.dim)?;
        Ok(x.clone())
    }

    fn to_physical(&self, u: &Point) -> ReliabilityResult<Point> {
        validate_dim(u, self.dim)?;
        Ok(u.clone())
    }

    fn jacobian(&self, u: &Point) -> ReliabilityResult<Jacobian> {
        validate_dim(u, self.dim)?;
        Ok(Array2::eye(self.dim))
    }

    fn is_affine(&self) -> bool {
        true
    }
}

/// Affine map `x = m + A u` with precomputed inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    shift: Point,
    matrix: Jacobian,
    inverse: Jacobian,
}

impl AffineTransform {
    /// Build `x = shift + matrix · u`.
    ///
    /// # Errors
    /// - [`ReliabilityError::EmptyDimension`] if `shift` is empty.
    /// - [`ReliabilityError::InvalidPoint`] if `shift` has non-finite entries.
    /// - [`ReliabilityError::JacobianDimMismatch`] if `matrix` is not `n × n`.
    /// - [`ReliabilityError::SingularTransform`] if `matrix` is non-finite or
    ///   not invertible.
    pub fn new(shift: Point, matrix: Jacobian) -> ReliabilityResult<Self> {
        let n = shift.len();
        if n == 0 {
            return Err(ReliabilityError::EmptyDimension);
        }
        validate_point(&shift, n)?;
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(ReliabilityError::JacobianDimMismatch {
                expected: n,
                found: (matrix.nrows(), matrix.ncols()),
            });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(ReliabilityError::SingularTransform);
        }
        let nalg = DMatrix::<f64>::from_fn(n, n, |i, j| matrix[[i, j]]);
        let inv = nalg.try_inverse().ok_or(ReliabilityError::SingularTransform)?;
        let inverse = Array2::from_shape_fn((n, n), |(i, j)| inv[(i, j)]);
        Ok(Self { shift, matrix, inverse })
    }

    /// Independent normal marginals: `x_i = μ_i + σ_i u_i`.
    ///
    /// # Errors
    /// - [`ReliabilityError::DimensionMismatch`] if the lengths differ.
    /// - [`ReliabilityError::SingularTransform`] if any `σ_i` is not strictly
    ///   positive and finite.
    pub fn independent_normal(means: Point, std_devs: Point) -> ReliabilityResult<Self> {
        validate_dim(&std_devs, means.len())?;
        if std_devs.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(ReliabilityError::SingularTransform);
        }
        let mut matrix = Array2::zeros((means.len(), means.len()));
        matrix.diag_mut().assign(&std_devs);
        Self::new(means, matrix)
    }

    pub fn shift(&self) -> &Point {
        &self.shift
    }

    pub fn matrix(&self) -> &Jacobian {
        &self.matrix
    }
}

impl SpaceTransform for AffineTransform {
    fn dim(&self) -> usize {
        self.shift.len()
    }

    fn to_standard_normal(&self, x: &Point) -> ReliabilityResult<Point> {
        validate_dim(x, self.dim())?;
        Ok(self.inverse.dot(&(x - &self.shift)))
    }

    fn to_physical(&self, u: &Point) -> ReliabilityResult<Point> {
        validate_dim(u, self.dim())?;
        Ok(&self.shift + &self.matrix.dot(u))
    }

    fn jacobian(&self, u: &Point) -> ReliabilityResult<Jacobian> {
        validate_dim(u, self.dim())?;
        Ok(self.matrix.clone())
    }

    fn is_affine(&self) -> bool {
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
    // Independent-normal transforms map u ↔ x consistently.
    //
    // Given
    // -----
    // - μ = [200, 150], σ = [20, 10] and u = [-2, 1].
    //
    // Expect
    // ------
    // - x = [160, 160]; mapping back recovers u; J = diag(σ).
    fn independent_normal_round_trip() {
        // Arrange
        let t = AffineTransform::independent_normal(array![200.0, 150.0], array![20.0, 10.0])
            .unwrap();
        let u = array![-2.0, 1.0];

        // Act
        let x = t.to_physical(&u).unwrap();
        let back = t.to_standard_normal(&x).unwrap();
        let jac = t.jacobian(&u).unwrap();

        // Assert
        assert_eq!(x, array![160.0, 160.0]);
        assert!((&back - &u).iter().all(|d| d.abs() < 1e-12));
        assert_eq!(jac, array![[20.0, 0.0], [0.0, 10.0]]);
        assert!(t.is_affine());
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let err = AffineTransform::new(array![0.0, 0.0], array![[1.0, 2.0], [2.0, 4.0]])
            .unwrap_err();
        assert_eq!(err, ReliabilityError::SingularTransform);
    }

    #[test]
    fn non_positive_std_dev_is_rejected() {
        let err = AffineTransform::independent_normal(array![0.0], array![0.0]).unwrap_err();
        assert_eq!(err, ReliabilityError::SingularTransform);
    }

    #[test]
    fn identity_requires_positive_dimension() {
        assert_eq!(IdentityTransform::new(0).unwrap_err(), ReliabilityError::EmptyDimension);
        let t = IdentityTransform::new(2).unwrap();
        assert_eq!(t.jacobian(&array![0.3, -0.1]).unwrap(), Array2::<f64>::eye(2));
    }
}

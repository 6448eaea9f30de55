//! Configuration for gradient and Hessian estimation.
//!
//! - [`DerivativeMode`]: analytical vs finite-difference selection policy.
//! - [`DiffScheme`]: forward or central stencils.
//! - [`StepSize`]: adaptive (precision-scaled), uniform, or
//!   per-coordinate perturbation sizes in standard normal space.
//! - [`FiniteDiffOptions`]: bundles scheme, step, and whether stencil
//!   evaluations may run on the rayon pool.
//!
//! All string-selectable enums parse case-insensitively via `FromStr`.
use std::str::FromStr;

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    model::types::Point,
};

/// Default finite-difference step in standard normal space.
pub const DEFAULT_FD_STEP: f64 = 0.01;

/// How derivatives are obtained from the performance function.
///
/// Variants:
/// - `Auto`: use the analytical derivative when the performance function
///   advertises it, otherwise finite differences.
/// - `Analytical`: require the analytical derivative; a missing capability is
///   an input-contract violation reported before any iteration.
/// - `FiniteDifference`: always difference the model numerically.
///
/// Parsing accepts `"auto"`, `"analytical"`, `"fd"` / `"finite_difference"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivativeMode {
    #[default]
    Auto,
    Analytical,
    FiniteDifference,
}

impl FromStr for DerivativeMode {
    type Err = ReliabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(DerivativeMode::Auto),
            "analytical" | "analytic" => Ok(DerivativeMode::Analytical),
            "fd" | "finite_difference" | "finitedifference" => {
                Ok(DerivativeMode::FiniteDifference)
            }
            _ => Err(ReliabilityError::InvalidOptionName {
                option: "derivative mode",
                name: s.to_string(),
                reason: "Valid options are case insensitive 'auto', 'analytical' or 'fd'.",
            }),
        }
    }
}

/// Finite-difference stencil family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffScheme {
    Forward,
    #[default]
    Central,
}

impl FromStr for DiffScheme {
    type Err = ReliabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(DiffScheme::Forward),
            "central" => Ok(DiffScheme::Central),
            _ => Err(ReliabilityError::InvalidOptionName {
                option: "difference scheme",
                name: s.to_string(),
                reason: "Valid options are case insensitive 'forward' or 'central'.",
            }),
        }
    }
}

/// Perturbation size per coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSize {
    /// Machine-precision-scaled steps: the `finitediff` crate's choice for
    /// gradients, `ε^(1/4)` or `ε^(1/3)` scaling for value-only Hessians.
    Adaptive,
    /// Same step `h` for every coordinate.
    Uniform(f64),
    /// One step per coordinate; length must match the problem dimension.
    PerCoordinate(Point),
}

/// Finite-difference configuration shared by gradient and Hessian estimation.
///
/// Default: central differences, uniform step `0.01`, sequential evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteDiffOptions {
    pub scheme: DiffScheme,
    pub step: StepSize,
    pub parallel: bool,
}

impl FiniteDiffOptions {
    /// Construct validated finite-difference options.
    ///
    /// # Errors
    /// [`ReliabilityError::InvalidStep`] if any explicit step is non-finite or
    /// not strictly positive.
    pub fn new(scheme: DiffScheme, step: StepSize, parallel: bool) -> ReliabilityResult<Self> {
        match &step {
            StepSize::Adaptive => {}
            StepSize::Uniform(h) => verify_step(0, *h)?,
            StepSize::PerCoordinate(hs) => {
                for (index, &h) in hs.iter().enumerate() {
                    verify_step(index, h)?;
                }
            }
        }
        Ok(Self { scheme, step, parallel })
    }

    /// Resolve explicit steps for a problem of dimension `dim`.
    ///
    /// Returns `None` for [`StepSize::Adaptive`].
    ///
    /// # Errors
    /// - [`ReliabilityError::DimensionMismatch`] if per-coordinate steps have
    ///   the wrong length.
    /// - [`ReliabilityError::InvalidStep`] for non-positive or non-finite steps
    ///   (fields are public, so they are re-checked here).
    pub fn steps(&self, dim: usize) -> ReliabilityResult<Option<Point>> {
        match &self.step {
            StepSize::Adaptive => Ok(None),
            StepSize::Uniform(h) => {
                verify_step(0, *h)?;
                Ok(Some(Point::from_elem(dim, *h)))
            }
            StepSize::PerCoordinate(hs) => {
                if hs.len() != dim {
                    return Err(ReliabilityError::DimensionMismatch {
                        expected: dim,
                        found: hs.len(),
                    });
                }
                for (index, &h) in hs.iter().enumerate() {
                    verify_step(index, h)?;
                }
                Ok(Some(hs.clone()))
            }
        }
    }
}

impl Default for FiniteDiffOptions {
    fn default() -> Self {
        Self {
            scheme: DiffScheme::Central,
            step: StepSize::Uniform(DEFAULT_FD_STEP),
            parallel: false,
        }
    }
}

fn verify_step(index: usize, value: f64) -> ReliabilityResult<()> {
    if !value.is_finite() {
        return Err(ReliabilityError::InvalidStep { index, value, reason: "Step must be finite." });
    }
    if value <= 0.0 {
        return Err(ReliabilityError::InvalidStep {
            index,
            value,
            reason: "Step must be positive.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("CENTRAL".parse::<DiffScheme>().unwrap(), DiffScheme::Central);
        assert_eq!("Forward".parse::<DiffScheme>().unwrap(), DiffScheme::Forward);
        assert_eq!("FD".parse::<DerivativeMode>().unwrap(), DerivativeMode::FiniteDifference);
        assert_eq!("Analytical".parse::<DerivativeMode>().unwrap(), DerivativeMode::Analytical);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "backward".parse::<DiffScheme>().unwrap_err();
        assert!(matches!(
            err,
            ReliabilityError::InvalidOptionName { option: "difference scheme", .. }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Explicit steps are validated at construction and at resolution time.
    //
    // Given
    // -----
    // - A negative uniform step, a per-coordinate vector containing zero, and
    //   a valid per-coordinate vector resolved against the wrong dimension.
    //
    // Expect
    // ------
    // - `InvalidStep` for the first two, `DimensionMismatch` for the third.
    fn explicit_steps_are_validated() {
        // Arrange / Act
        let negative = FiniteDiffOptions::new(DiffScheme::Central, StepSize::Uniform(-0.1), false);
        let zero = FiniteDiffOptions::new(
            DiffScheme::Forward,
            StepSize::PerCoordinate(array![0.1, 0.0]),
            false,
        );
        let valid = FiniteDiffOptions::new(
            DiffScheme::Forward,
            StepSize::PerCoordinate(array![0.1, 0.2]),
            false,
        )
        .unwrap();

        // Assert
        assert!(matches!(negative, Err(ReliabilityError::InvalidStep { index: 0, .. })));
        assert!(matches!(zero, Err(ReliabilityError::InvalidStep { index: 1, .. })));
        assert_eq!(
            valid.steps(3).unwrap_err(),
            ReliabilityError::DimensionMismatch { expected: 3, found: 2 }
        );
    }

    #[test]
    fn default_uses_uniform_central_step() {
        let opts = FiniteDiffOptions::default();
        assert_eq!(opts.steps(2).unwrap(), Some(array![DEFAULT_FD_STEP, DEFAULT_FD_STEP]));
        assert_eq!(FiniteDiffOptions { step: StepSize::Adaptive, ..opts }.steps(2).unwrap(), None);
    }
}

//! errors — unified error surface for FORM/SORM analyses.
//!
//! Purpose
//! -------
//! Collect every failure the reliability layer can report into a single enum,
//! [`ReliabilityError`], with a shared result alias [`ReliabilityResult<T>`].
//! Configuration mistakes, missing model capabilities, numerical breakdowns,
//! and argmin backend errors all surface through this type.
//!
//! Key behaviors
//! -------------
//! - Classify each variant into a coarse [`ErrorKind`] so callers can branch
//!   on the taxonomy (degenerate gradient, invalid curvature, contract
//!   violation, ...) without matching every variant.
//! - Convert `argmin::core::Error` back into [`ReliabilityError`] after a
//!   solver run, recovering errors raised by user callbacks.
//!
//! Conventions
//! -----------
//! - Non-convergence is **not** an error; it is reported through
//!   `ConvergenceStatus` with a best-effort design point.
//! - Invalid SORM curvature is an error at the correction-formula level and a
//!   validity tag at the `sorm` entry point.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for reliability operations.
pub type ReliabilityResult<T> = Result<T, ReliabilityError>;

/// Coarse classification of [`ReliabilityError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The gradient norm vanished during the HLRF search.
    NumericalDegeneracy,
    /// A SORM correction factor `1 + β·κ_i` was not strictly positive.
    InvalidCurvature,
    /// The model or transform lacks a capability the call requires.
    InputContractViolation,
    /// Options were rejected at construction time.
    InvalidConfiguration,
    /// A model output or derived quantity was non-finite or out of range.
    NumericalFailure,
    /// Error originating from the argmin executor.
    Backend,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReliabilityError {
    // ---- HLRF ----
    /// ‖∇G(U_k)‖ is numerically zero; the linearization is undefined.
    NumericalDegeneracy { iteration: usize, grad_norm: f64 },

    // ---- SORM ----
    /// Correction factor `1 + β·κ_i` is not strictly positive.
    InvalidCurvature { index: usize, curvature: f64, factor: f64 },
    /// A probability left the unit interval.
    ProbabilityOutOfRange { value: f64 },

    // ---- Input contract ----
    /// The performance function does not provide an analytical gradient.
    GradientNotImplemented,
    /// The performance function does not provide an analytical Hessian.
    HessianNotImplemented,
    /// A required capability is missing for the requested derivative mode.
    MissingCapability { capability: &'static str, reason: &'static str },
    /// Point dimension does not match the transform dimension.
    DimensionMismatch { expected: usize, found: usize },
    /// Zero-dimensional problems are rejected.
    EmptyDimension,

    // ---- Options ----
    /// A convergence tolerance must be positive and finite.
    InvalidTolerance { name: &'static str, tol: f64, reason: &'static str },
    /// All convergence criteria were disabled.
    NoCriteriaEnabled,
    /// A finite-difference step must be positive and finite.
    InvalidStep { index: usize, value: f64, reason: &'static str },
    /// Unknown name passed to a `FromStr` option.
    InvalidOptionName { option: &'static str, name: String, reason: &'static str },

    // ---- Model outputs ----
    /// The performance function returned a non-finite value.
    NonFiniteValue { value: f64 },
    /// Point coordinates must be finite.
    InvalidPoint { index: usize, value: f64, reason: &'static str },
    /// Gradient dimensions do not match point dimensions.
    GradientDimMismatch { expected: usize, found: usize },
    /// Gradient entries must be finite.
    InvalidGradient { index: usize, value: f64, reason: &'static str },
    /// Hessian dimensions do not match point dimensions.
    HessianDimMismatch { expected: usize, found: (usize, usize) },
    /// Hessian entries must be finite.
    InvalidHessian { row: usize, col: usize, value: f64 },
    /// Jacobian dimensions do not match point dimensions.
    JacobianDimMismatch { expected: usize, found: (usize, usize) },
    /// The affine map is not invertible.
    SingularTransform,

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },
}

impl ReliabilityError {
    /// Map the variant onto the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReliabilityError::NumericalDegeneracy { .. } => ErrorKind::NumericalDegeneracy,
            ReliabilityError::InvalidCurvature { .. } => ErrorKind::InvalidCurvature,
            ReliabilityError::GradientNotImplemented
            | ReliabilityError::HessianNotImplemented
            | ReliabilityError::MissingCapability { .. }
            | ReliabilityError::DimensionMismatch { .. }
            | ReliabilityError::EmptyDimension => ErrorKind::InputContractViolation,
            ReliabilityError::InvalidTolerance { .. }
            | ReliabilityError::NoCriteriaEnabled
            | ReliabilityError::InvalidStep { .. }
            | ReliabilityError::InvalidOptionName { .. } => ErrorKind::InvalidConfiguration,
            ReliabilityError::ProbabilityOutOfRange { .. }
            | ReliabilityError::NonFiniteValue { .. }
            | ReliabilityError::InvalidPoint { .. }
            | ReliabilityError::GradientDimMismatch { .. }
            | ReliabilityError::InvalidGradient { .. }
            | ReliabilityError::HessianDimMismatch { .. }
            | ReliabilityError::InvalidHessian { .. }
            | ReliabilityError::JacobianDimMismatch { .. }
            | ReliabilityError::SingularTransform => ErrorKind::NumericalFailure,
            ReliabilityError::InvalidParameter { .. }
            | ReliabilityError::NotImplemented { .. }
            | ReliabilityError::NotInitialized { .. }
            | ReliabilityError::ConditionViolated { .. }
            | ReliabilityError::PotentialBug { .. }
            | ReliabilityError::BackendError { .. } => ErrorKind::Backend,
        }
    }
}

impl std::error::Error for ReliabilityError {}

impl std::fmt::Display for ReliabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- HLRF ----
            ReliabilityError::NumericalDegeneracy { iteration, grad_norm } => {
                write!(
                    f,
                    "Numerical degeneracy at iteration {iteration}: gradient norm {grad_norm} is numerically zero"
                )
            }

            // ---- SORM ----
            ReliabilityError::InvalidCurvature { index, curvature, factor } => {
                write!(
                    f,
                    "Invalid curvature at index {index}: kappa = {curvature}, 1 + beta * kappa = {factor} is not positive"
                )
            }
            ReliabilityError::ProbabilityOutOfRange { value } => {
                write!(f, "Probability {value} lies outside [0, 1]")
            }

            // ---- Input contract ----
            ReliabilityError::GradientNotImplemented => {
                write!(f, "Analytical gradient not implemented")
            }
            ReliabilityError::HessianNotImplemented => {
                write!(f, "Analytical Hessian not implemented")
            }
            ReliabilityError::MissingCapability { capability, reason } => {
                write!(f, "Missing capability '{capability}': {reason}")
            }
            ReliabilityError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected}, found {found}")
            }
            ReliabilityError::EmptyDimension => {
                write!(f, "Problem dimension must be at least 1")
            }

            // ---- Options ----
            ReliabilityError::InvalidTolerance { name, tol, reason } => {
                write!(f, "Invalid tolerance {name} = {tol}: {reason}")
            }
            ReliabilityError::NoCriteriaEnabled => {
                write!(f, "At least one convergence criterion must be enabled")
            }
            ReliabilityError::InvalidStep { index, value, reason } => {
                write!(f, "Invalid finite-difference step at index {index}: {value}: {reason}")
            }
            ReliabilityError::InvalidOptionName { option, name, reason } => {
                write!(f, "Invalid {option} '{name}': {reason}")
            }

            // ---- Model outputs ----
            ReliabilityError::NonFiniteValue { value } => {
                write!(f, "Performance function returned a non-finite value: {value}")
            }
            ReliabilityError::InvalidPoint { index, value, reason } => {
                write!(f, "Invalid point coordinate at index {index}: {value}: {reason}")
            }
            ReliabilityError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            ReliabilityError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }
            ReliabilityError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            ReliabilityError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }
            ReliabilityError::JacobianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Jacobian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            ReliabilityError::SingularTransform => {
                write!(f, "Affine transform matrix is singular")
            }

            // ---- Argmin ----
            ReliabilityError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            ReliabilityError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            ReliabilityError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            ReliabilityError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            ReliabilityError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            ReliabilityError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }
        }
    }
}

impl From<Error> for ReliabilityError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<ReliabilityError>() {
            Ok(err) => return err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => {
                    ReliabilityError::InvalidParameter { text }
                }
                ArgminError::NotImplemented { text } => ReliabilityError::NotImplemented { text },
                ArgminError::NotInitialized { text } => ReliabilityError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => {
                    ReliabilityError::ConditionViolated { text }
                }
                ArgminError::PotentialBug { text } => ReliabilityError::PotentialBug { text },
                other => ReliabilityError::BackendError { text: other.to_string() },
            },
            Err(err) => ReliabilityError::BackendError { text: err.to_string() },
        }
    }
}

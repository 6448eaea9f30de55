//! Configuration for the HLRF design-point search.
//!
//! - [`ConvergenceCriteria`]: tolerances for the three residuals
//!   `e1 = ‖U_{k+1} − U_k‖`, `e2 = |β_{k+1} − β_k|`, `e3 = ‖∇G_{k+1} − ∇G_k‖`.
//! - [`ConvergencePolicy`]: whether any or all enabled criteria terminate.
//! - [`StartPoint`]: origin, a standard normal seed, or a physical seed.
//! - [`FormOptions`]: everything a single `form` call needs.
use std::{str::FromStr, time::Duration};

use crate::{
    derivatives::options::{DerivativeMode, FiniteDiffOptions},
    errors::{ReliabilityError, ReliabilityResult},
    model::types::Point,
};

/// Default tolerance for every convergence residual.
pub const DEFAULT_TOL: f64 = 1e-3;

/// Default iteration ceiling.
pub const DEFAULT_MAX_ITER: usize = 100;

/// One of the three HLRF convergence residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// `e1 = ‖U_{k+1} − U_k‖`
    StepNorm,
    /// `e2 = |β_{k+1} − β_k|`
    BetaChange,
    /// `e3 = ‖∇G(U_{k+1}) − ∇G(U_k)‖`
    GradientChange,
}

/// How enabled criteria combine into a termination decision.
///
/// Parsing accepts `"any"` and `"all"`, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergencePolicy {
    /// Stop as soon as one enabled criterion holds.
    #[default]
    Any,
    /// Stop only when every enabled criterion holds.
    All,
}

impl FromStr for ConvergencePolicy {
    type Err = ReliabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(ConvergencePolicy::Any),
            "all" => Ok(ConvergencePolicy::All),
            _ => Err(ReliabilityError::InvalidOptionName {
                option: "convergence policy",
                name: s.to_string(),
                reason: "Valid options are case insensitive 'any' or 'all'.",
            }),
        }
    }
}

/// Tolerances for the HLRF residuals.
///
/// - `tol_step`: threshold on `e1`; `None` disables it.
/// - `tol_beta`: threshold on `e2`; `None` disables it.
/// - `tol_grad`: threshold on `e3`; `None` disables it.
///
/// At least one criterion must be enabled (see [`ConvergenceCriteria::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceCriteria {
    pub tol_step: Option<f64>,
    pub tol_beta: Option<f64>,
    pub tol_grad: Option<f64>,
}

impl ConvergenceCriteria {
    /// Construct validated criteria.
    ///
    /// # Errors
    /// - [`ReliabilityError::NoCriteriaEnabled`] if all three are `None`.
    /// - [`ReliabilityError::InvalidTolerance`] for non-finite or non-positive
    ///   tolerances.
    pub fn new(
        tol_step: Option<f64>, tol_beta: Option<f64>, tol_grad: Option<f64>,
    ) -> ReliabilityResult<Self> {
        let criteria = Self { tol_step, tol_beta, tol_grad };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Re-check the public fields.
    pub fn validate(&self) -> ReliabilityResult<()> {
        if self.tol_step.is_none() && self.tol_beta.is_none() && self.tol_grad.is_none() {
            return Err(ReliabilityError::NoCriteriaEnabled);
        }
        verify_tol("tol_step", self.tol_step)?;
        verify_tol("tol_beta", self.tol_beta)?;
        verify_tol("tol_grad", self.tol_grad)?;
        Ok(())
    }

    /// Enabled criteria with their tolerances, in `e1, e2, e3` order.
    pub fn enabled(&self) -> Vec<(Criterion, f64)> {
        [
            (Criterion::StepNorm, self.tol_step),
            (Criterion::BetaChange, self.tol_beta),
            (Criterion::GradientChange, self.tol_grad),
        ]
        .into_iter()
        .filter_map(|(criterion, tol)| tol.map(|t| (criterion, t)))
        .collect()
    }
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            tol_step: Some(DEFAULT_TOL),
            tol_beta: Some(DEFAULT_TOL),
            tol_grad: Some(DEFAULT_TOL),
        }
    }
}

/// Initial point of the HLRF search.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartPoint {
    /// `U_0 = 0`, the mean in standard normal space.
    #[default]
    Origin,
    /// `U_0` given directly in standard normal space.
    Standard(Point),
    /// `X_0` in physical space, mapped through the transform.
    Physical(Point),
}

/// Options for a single FORM analysis.
///
/// Fields:
/// - `criteria`, `policy`: termination rule (default: all three residuals at
///   `1e-3`, `Any`).
/// - `max_iter`: iteration ceiling (default `100`). `0` returns the start
///   point unmodified as non-converged.
/// - `start`: initial point (default origin).
/// - `gradient`, `finite_diff`: gradient strategy and finite-difference
///   settings, resolved once per call.
/// - `timeout`: optional wall-clock deadline for the executor.
/// - `record_history`: keep every [`IterationState`](crate::form::state::IterationState).
/// - `verbose`: attach a terminal observer (behind the `obs_slog` feature).
#[derive(Debug, Clone, PartialEq)]
pub struct FormOptions {
    pub criteria: ConvergenceCriteria,
    pub policy: ConvergencePolicy,
    pub max_iter: usize,
    pub start: StartPoint,
    pub gradient: DerivativeMode,
    pub finite_diff: FiniteDiffOptions,
    pub timeout: Option<Duration>,
    pub record_history: bool,
    pub verbose: bool,
}

impl FormOptions {
    /// Build options with the given termination rule and defaults elsewhere.
    ///
    /// # Errors
    /// Propagates [`ConvergenceCriteria::validate`].
    pub fn new(
        criteria: ConvergenceCriteria, policy: ConvergencePolicy, max_iter: usize,
    ) -> ReliabilityResult<Self> {
        criteria.validate()?;
        Ok(Self { criteria, policy, max_iter, ..Self::default() })
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            criteria: ConvergenceCriteria::default(),
            policy: ConvergencePolicy::Any,
            max_iter: DEFAULT_MAX_ITER,
            start: StartPoint::Origin,
            gradient: DerivativeMode::Auto,
            finite_diff: FiniteDiffOptions::default(),
            timeout: None,
            record_history: false,
            verbose: false,
        }
    }
}

fn verify_tol(name: &'static str, tol: Option<f64>) -> ReliabilityResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(ReliabilityError::InvalidTolerance {
                name,
                tol,
                reason: "Tolerance must be finite.",
            });
        }
        if tol <= 0.0 {
            return Err(ReliabilityError::InvalidTolerance {
                name,
                tol,
                reason: "Tolerance must be positive.",
            });
        }
    }
    Ok(())
}

//! form::state — iteration records, convergence residuals, and design points.
//!
//! Purpose
//! -------
//! Model the HLRF search as an explicit sequence of immutable
//! [`IterationState`] records, so that every convergence decision can be
//! recomputed from the two states it compared.
//!
//! Key behaviors
//! -------------
//! - [`Residuals::between`] computes `e1`, `e2`, `e3` from two consecutive
//!   states.
//! - [`Residuals::satisfied`] lists the enabled criteria that hold;
//!   [`ConvergencePolicy::is_met`] folds that list into a decision.
//! - [`DesignPoint`] bundles `U*`, `β_HL = ‖U*‖`, the gradient at `U*`, and the
//!   final [`ConvergenceStatus`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `beta == ‖point‖ ≥ 0` for every state; it is computed, never supplied.
//! - A state's gradient was evaluated at that state's point.
use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    form::options::{ConvergenceCriteria, ConvergencePolicy, Criterion},
    model::types::{Grad, Point},
    numerics::{form_probability, l2_norm, DEGENERACY_EPS},
};

/// One HLRF iterate: `{k, U_k, G(U_k), ∇G(U_k), β_k}`.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationState {
    pub index: usize,
    pub point: Point,
    pub value: f64,
    pub gradient: Grad,
    pub beta: f64,
}

impl IterationState {
    pub fn new(index: usize, point: Point, value: f64, gradient: Grad) -> Self {
        let beta = l2_norm(&point);
        Self { index, point, value, gradient, beta }
    }

    pub fn grad_norm(&self) -> f64 {
        l2_norm(&self.gradient)
    }
}

/// Convergence residuals between two consecutive iterates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residuals {
    /// `‖U_{k+1} − U_k‖`
    pub e1: f64,
    /// `|β_{k+1} − β_k|`
    pub e2: f64,
    /// `‖∇G(U_{k+1}) − ∇G(U_k)‖`
    pub e3: f64,
}

impl Residuals {
    pub fn between(previous: &IterationState, next: &IterationState) -> Self {
        Self {
            e1: l2_norm(&(&next.point - &previous.point)),
            e2: (next.beta - previous.beta).abs(),
            e3: l2_norm(&(&next.gradient - &previous.gradient)),
        }
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::StepNorm => self.e1,
            Criterion::BetaChange => self.e2,
            Criterion::GradientChange => self.e3,
        }
    }

    /// Enabled criteria whose residual is within tolerance, in `e1, e2, e3`
    /// order.
    pub fn satisfied(&self, criteria: &ConvergenceCriteria) -> Vec<Criterion> {
        criteria
            .enabled()
            .into_iter()
            .filter(|&(criterion, tol)| self.get(criterion) <= tol)
            .map(|(criterion, _)| criterion)
            .collect()
    }
}

impl ConvergencePolicy {
    /// Decide termination from the satisfied subset of `criteria`.
    pub fn is_met(&self, satisfied: &[Criterion], criteria: &ConvergenceCriteria) -> bool {
        match self {
            ConvergencePolicy::Any => !satisfied.is_empty(),
            ConvergencePolicy::All => {
                !satisfied.is_empty() && satisfied.len() == criteria.enabled().len()
            }
        }
    }
}

/// Termination report of one HLRF run.
///
/// - `converged`: the configured policy was met before the iteration limit.
/// - `iterations`: HLRF updates performed.
/// - `satisfied`: criteria that held at the final comparison.
/// - `residuals`: `e1/e2/e3` of the final comparison; `None` when no update
///   was performed.
/// - `termination`: executor termination status as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceStatus {
    pub converged: bool,
    pub iterations: usize,
    pub satisfied: Vec<Criterion>,
    pub residuals: Option<Residuals>,
    pub termination: String,
}

/// Design point `U*` with its reliability index and convergence report.
///
/// When `status.converged` is `false` this is the last iterate, returned as a
/// best-effort result.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignPoint {
    pub point: Point,
    pub beta: f64,
    pub value: f64,
    pub gradient: Grad,
    pub status: ConvergenceStatus,
}

impl DesignPoint {
    pub fn from_state(state: &IterationState, status: ConvergenceStatus) -> Self {
        Self {
            point: state.point.clone(),
            beta: state.beta,
            value: state.value,
            gradient: state.gradient.clone(),
            status,
        }
    }

    /// `P_f = Φ(−β_HL)`.
    pub fn probability_of_failure(&self) -> f64 {
        form_probability(self.beta)
    }

    pub fn grad_norm(&self) -> f64 {
        l2_norm(&self.gradient)
    }

    /// Unit normal `α = −∇G(U*) / ‖∇G(U*)‖`, pointing into the failure domain.
    ///
    /// # Errors
    /// [`ReliabilityError::NumericalDegeneracy`] if the gradient vanishes.
    pub fn alpha(&self) -> ReliabilityResult<Point> {
        let norm = self.grad_norm();
        if norm <= DEGENERACY_EPS {
            return Err(ReliabilityError::NumericalDegeneracy {
                iteration: self.status.iterations,
                grad_norm: norm,
            });
        }
        Ok(-&self.gradient / norm)
    }

    /// Importance factors `α_i²`; they sum to one.
    pub fn importance_factors(&self) -> ReliabilityResult<Point> {
        Ok(self.alpha()?.mapv(|a| a * a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn state(index: usize, point: Point, gradient: Grad) -> IterationState {
        IterationState::new(index, point, 0.0, gradient)
    }

    #[test]
    // Purpose
    // -------
    // Residuals are computed from consecutive states exactly as defined.
    //
    // Given
    // -----
    // - U_0 = [0, 0], ∇G_0 = [3, 4]; U_1 = [1.2, 1.6], ∇G_1 = [3, 4].
    //
    // Expect
    // ------
    // - e1 = 2, e2 = 2, e3 = 0.
    fn residuals_between_states() {
        // Arrange
        let s0 = state(0, array![0.0, 0.0], array![3.0, 4.0]);
        let s1 = state(1, array![1.2, 1.6], array![3.0, 4.0]);

        // Act
        let r = Residuals::between(&s0, &s1);

        // Assert
        assert!((r.e1 - 2.0).abs() < 1e-12);
        assert!((r.e2 - 2.0).abs() < 1e-12);
        assert_eq!(r.e3, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // `Any` and `All` fold the satisfied subset differently.
    //
    // Given
    // -----
    // - Default criteria (1e-3 each) and residuals where only e3 holds.
    //
    // Expect
    // ------
    // - `Any` terminates, `All` does not; the satisfied list is `[e3]`.
    fn policies_fold_satisfied_criteria() {
        // Arrange
        let criteria = ConvergenceCriteria::default();
        let r = Residuals { e1: 0.5, e2: 0.2, e3: 0.0 };

        // Act
        let satisfied = r.satisfied(&criteria);

        // Assert
        assert_eq!(satisfied, vec![Criterion::GradientChange]);
        assert!(ConvergencePolicy::Any.is_met(&satisfied, &criteria));
        assert!(!ConvergencePolicy::All.is_met(&satisfied, &criteria));
    }

    #[test]
    fn disabled_criteria_are_never_satisfied() {
        let criteria = ConvergenceCriteria::new(Some(1e-3), None, None).unwrap();
        let r = Residuals { e1: 1.0, e2: 0.0, e3: 0.0 };
        assert!(r.satisfied(&criteria).is_empty());
        assert!(!ConvergencePolicy::All.is_met(&[], &criteria));
    }

    #[test]
    fn alpha_points_against_gradient_and_importance_sums_to_one() {
        let status = ConvergenceStatus {
            converged: true,
            iterations: 1,
            satisfied: vec![Criterion::StepNorm],
            residuals: None,
            termination: String::new(),
        };
        let dp = DesignPoint::from_state(&state(1, array![1.2, 1.6], array![-3.0, -4.0]), status);
        let alpha = dp.alpha().unwrap();
        assert!((&alpha - &array![0.6, 0.8]).iter().all(|d| d.abs() < 1e-12));
        assert!((dp.importance_factors().unwrap().sum() - 1.0).abs() < 1e-12);
        assert!((dp.beta - 2.0).abs() < 1e-12);
    }

    #[test]
    fn alpha_rejects_vanishing_gradient() {
        let status = ConvergenceStatus {
            converged: false,
            iterations: 0,
            satisfied: Vec::new(),
            residuals: None,
            termination: String::new(),
        };
        let dp = DesignPoint::from_state(&state(0, array![0.0], array![0.0]), status);
        assert!(matches!(dp.alpha(), Err(ReliabilityError::NumericalDegeneracy { .. })));
    }
}

//! form::api — the FORM entry point.
//!
//! Purpose
//! -------
//! Locate the design point of `G ∘ T` with HLRF and report the first-order
//! reliability index and failure probability, together with enough state to
//! justify the convergence decision and to feed SORM.
//!
//! Key behaviors
//! -------------
//! - Resolves the gradient strategy and the start point **before** any
//!   iteration; capability and configuration problems fail fast.
//! - Non-convergence is not an error: the last iterate is returned with
//!   `converged == false` and a `warn!` event.
//! - Numerical degeneracy aborts the run with an error.
//!
//! Downstream usage
//! ----------------
//! - [`FormOutcome`] is consumed read-only by [`crate::sorm::sorm`].
use tracing::{info, warn};

use crate::{
    errors::ReliabilityResult,
    form::{
        options::{FormOptions, StartPoint},
        run::run_hlrf,
        state::{DesignPoint, IterationState},
    },
    model::{
        adapter::StandardSpaceModel,
        traits::{PerformanceFunction, SpaceTransform},
        types::{FnEvalMap, Point},
        validation::validate_point,
    },
};

/// Result of a FORM analysis.
///
/// - `design_point`: `U*`, `β_HL`, `∇G(U*)`, and the convergence status.
/// - `physical_point`: `T(U*)`.
/// - `beta`, `probability_of_failure`: `β_HL` and `Φ(−β_HL)`.
/// - `converged`, `iterations`: shortcuts into `design_point.status`.
/// - `fn_evals`: argmin counters (`cost_count`, `gradient_count`).
/// - `final_state`, `previous_state`: the two states behind the final
///   residuals.
/// - `history`: every iterate, when `record_history` was set.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOutcome {
    pub design_point: DesignPoint,
    pub physical_point: Point,
    pub beta: f64,
    pub probability_of_failure: f64,
    pub converged: bool,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub final_state: IterationState,
    pub previous_state: Option<IterationState>,
    pub history: Option<Vec<IterationState>>,
}

/// form — run HLRF and report the FORM reliability index.
///
/// Parameters
/// ----------
/// - `g`: performance function in physical space; failure is `G < 0`.
/// - `transform`: map between physical and standard normal space.
/// - `opts`: termination rule, start point, gradient strategy, limits.
///
/// Returns
/// -------
/// A [`FormOutcome`]. Callers must check `converged` before trusting `beta`.
///
/// Errors
/// ------
/// - `InputContractViolation` kinds: missing analytical gradient, start point
///   of the wrong dimension, zero-dimensional transform.
/// - `InvalidConfiguration` kinds: invalid tolerances or steps.
/// - `NumericalDegeneracy` if `‖∇G‖` vanishes before convergence.
/// - Any error raised by `g` or `transform`.
///
/// Examples
/// --------
/// ```
/// use ndarray::array;
/// use taylor_reliability::prelude::*;
///
/// let g = LinearPerformance::new(array![3.0, 4.0], -10.0).unwrap();
/// let t = IdentityTransform::new(2).unwrap();
/// let out = form(&g, &t, &FormOptions::default()).unwrap();
/// assert!(out.converged);
/// assert!((out.beta - 2.0).abs() < 1e-9);
/// ```
pub fn form<G, T>(g: &G, transform: &T, opts: &FormOptions) -> ReliabilityResult<FormOutcome>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    opts.criteria.validate()?;
    let model = StandardSpaceModel::new(g, transform, opts.gradient, &opts.finite_diff)?;
    let u0 = resolve_start(&model, &opts.start)?;

    let run = run_hlrf(u0, opts, model.clone())?;
    let design_point = DesignPoint::from_state(&run.final_state, run.status);
    let physical_point = model.to_physical(&design_point.point)?;
    let beta = design_point.beta;
    let probability_of_failure = design_point.probability_of_failure();
    let converged = design_point.status.converged;
    let iterations = design_point.status.iterations;

    if converged {
        info!(
            beta,
            probability_of_failure,
            iterations,
            satisfied = ?design_point.status.satisfied,
            "FORM converged"
        );
    } else {
        warn!(
            beta,
            iterations,
            termination = %design_point.status.termination,
            "FORM did not converge; returning the last iterate"
        );
    }

    Ok(FormOutcome {
        design_point,
        physical_point,
        beta,
        probability_of_failure,
        converged,
        iterations,
        fn_evals: run.fn_evals,
        final_state: run.final_state,
        previous_state: run.previous_state,
        history: run.history,
    })
}

fn resolve_start<G, T>(
    model: &StandardSpaceModel<'_, G, T>, start: &StartPoint,
) -> ReliabilityResult<Point>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    match start {
        StartPoint::Origin => Ok(Point::zeros(model.dim())),
        StartPoint::Standard(u0) => {
            validate_point(u0, model.dim())?;
            Ok(u0.clone())
        }
        StartPoint::Physical(x0) => model.to_standard_normal(x0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{ErrorKind, ReliabilityError},
        form::options::{ConvergenceCriteria, ConvergencePolicy},
        model::{
            functions::{FnPerformance, LinearPerformance},
            transforms::{AffineTransform, IdentityTransform},
        },
        numerics::std_normal_cdf,
    };
    use ndarray::array;
    use std::time::Duration;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - One-step convergence on linear limit states, from several starts.
    // - Convergence on a curved (spherical) limit state.
    // - The max_iter boundaries, the deadline, start-point validation, and
    //   degeneracy.
    //
    // They intentionally DO NOT cover:
    // - SORM corrections (see `sorm::api`).
    // -------------------------------------------------------------------------

    fn sphere() -> FnPerformance<impl Fn(&Point) -> f64 + Sync> {
        // ‖u − c‖² − 1 with c = (1, 2, 2): U* = (2/3, 4/3, 4/3), β = 2.
        FnPerformance::new(|u: &Point| {
            (u[0] - 1.0).powi(2) + (u[1] - 2.0).powi(2) + (u[2] - 2.0).powi(2) - 1.0
        })
    }

    #[test]
    // Purpose
    // -------
    // FORM is exact on a linear limit state and converges in one update.
    //
    // Given
    // -----
    // - G(u) = 3u1 + 4u2 − 10 with analytical gradient; identity transform;
    //   starts at the origin, [5, −7], and [−1, 0.3].
    //
    // Expect
    // ------
    // - β = 2, U* = [1.2, 1.6], P_f = Φ(−2), converged after 1 iteration.
    fn linear_limit_state_converges_in_one_iteration() {
        // Arrange
        let g = LinearPerformance::new(array![3.0, 4.0], -10.0).unwrap();
        let t = IdentityTransform::new(2).unwrap();
        let starts = [
            StartPoint::Origin,
            StartPoint::Standard(array![5.0, -7.0]),
            StartPoint::Standard(array![-1.0, 0.3]),
        ];

        for start in starts {
            let opts = FormOptions { start, ..FormOptions::default() };

            // Act
            let out = form(&g, &t, &opts).unwrap();

            // Assert
            assert!(out.converged);
            assert_eq!(out.iterations, 1);
            assert!((out.beta - 2.0).abs() < 1e-12);
            assert!((&out.design_point.point - &array![1.2, 1.6]).iter().all(|d| d.abs() < 1e-12));
            assert!((out.probability_of_failure - std_normal_cdf(-2.0)).abs() < 1e-15);
            assert!(out.previous_state.is_some());
        }
    }

    #[test]
    // Purpose
    // -------
    // HLRF with finite-difference gradients converges on a curved surface.
    //
    // Given
    // -----
    // - The sphere ‖u − (1, 2, 2)‖² = 1 (origin safe), values only.
    //
    // Expect
    // ------
    // - β ≈ 2 and U* ≈ (2/3, 4/3, 4/3) within 1e-3; G(U*) ≈ 0.
    fn sphere_converges_with_finite_differences() {
        // Arrange
        let g = sphere();
        let t = IdentityTransform::new(3).unwrap();
        let criteria = ConvergenceCriteria::new(Some(1e-6), None, None).unwrap();
        let opts = FormOptions::new(criteria, ConvergencePolicy::Any, 50).unwrap();

        // Act
        let out = form(&g, &t, &opts).unwrap();

        // Assert
        assert!(out.converged);
        assert!((out.beta - 2.0).abs() < 1e-3);
        let expected = array![2.0 / 3.0, 4.0 / 3.0, 4.0 / 3.0];
        assert!((&out.design_point.point - &expected).iter().all(|d| d.abs() < 1e-3));
        assert!(out.design_point.value.abs() < 1e-3);
        assert!(out.fn_evals.get("cost_count").copied().unwrap_or(0) > 0);
    }

    #[test]
    // Purpose
    // -------
    // max_iter = 0 reports non-convergence with the start point untouched.
    //
    // Given
    // -----
    // - Linear G, start [0.5, 0.5], max_iter = 0.
    //
    // Expect
    // ------
    // - converged = false, iterations = 0, U = start, no residuals.
    fn zero_iterations_returns_start_point() {
        // Arrange
        let g = LinearPerformance::new(array![3.0, 4.0], -10.0).unwrap();
        let t = IdentityTransform::new(2).unwrap();
        let opts = FormOptions {
            max_iter: 0,
            start: StartPoint::Standard(array![0.5, 0.5]),
            ..FormOptions::default()
        };

        // Act
        let out = form(&g, &t, &opts).unwrap();

        // Assert
        assert!(!out.converged);
        assert_eq!(out.iterations, 0);
        assert_eq!(out.design_point.point, array![0.5, 0.5]);
        assert!(out.design_point.status.residuals.is_none());
        assert!(out.previous_state.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Hitting the iteration ceiling after some updates keeps the last iterate
    // as a best-effort design point.
    //
    // Given
    // -----
    // - The sphere, policy `All` with all tolerances at 1e-14, max_iter = 2,
    //   history recording on.
    //
    // Expect
    // ------
    // - converged = false, iterations = 2, termination `MaxItersReached`, and
    //   the reported point equals the last recorded iterate.
    fn iteration_ceiling_returns_last_iterate() {
        // Arrange
        let g = sphere();
        let t = IdentityTransform::new(3).unwrap();
        let criteria = ConvergenceCriteria::new(Some(1e-14), Some(1e-14), Some(1e-14)).unwrap();
        let opts = FormOptions {
            record_history: true,
            ..FormOptions::new(criteria, ConvergencePolicy::All, 2).unwrap()
        };

        // Act
        let out = form(&g, &t, &opts).unwrap();

        // Assert
        assert!(!out.converged);
        assert_eq!(out.iterations, 2);
        assert!(out.design_point.status.termination.contains("MaxItersReached"));
        let history = out.history.expect("history was requested");
        assert_eq!(history.len(), 3);
        assert_eq!(out.design_point.point, history[2].point);
        assert_eq!(out.previous_state.as_ref(), Some(&history[1]));
        assert!(out.beta > 0.0 && out.beta < 2.0);
    }

    #[test]
    fn expired_deadline_stops_the_run() {
        let g = sphere();
        let t = IdentityTransform::new(3).unwrap();
        let criteria = ConvergenceCriteria::new(Some(1e-14), Some(1e-14), Some(1e-14)).unwrap();
        let opts = FormOptions {
            timeout: Some(Duration::ZERO),
            ..FormOptions::new(criteria, ConvergencePolicy::All, 100).unwrap()
        };
        let out = form(&g, &t, &opts).unwrap();
        assert!(!out.converged);
        assert_eq!(out.iterations, 1);
        assert!(out.design_point.status.termination.contains("Timeout"));
    }

    #[test]
    fn physical_start_is_mapped_to_standard_space() {
        let g = LinearPerformance::new(array![1.0, -1.0], 0.0).unwrap();
        let t = AffineTransform::independent_normal(array![200.0, 150.0], array![20.0, 10.0])
            .unwrap();
        let opts = FormOptions {
            max_iter: 0,
            start: StartPoint::Physical(array![160.0, 160.0]),
            ..FormOptions::default()
        };
        let out = form(&g, &t, &opts).unwrap();
        assert!((&out.design_point.point - &array![-2.0, 1.0]).iter().all(|d| d.abs() < 1e-12));
        assert!((&out.physical_point - &array![160.0, 160.0]).iter().all(|d| d.abs() < 1e-9));
    }

    #[test]
    fn wrong_start_dimension_fails_fast() {
        let g = LinearPerformance::new(array![3.0, 4.0], -10.0).unwrap();
        let t = IdentityTransform::new(2).unwrap();
        let opts =
            FormOptions { start: StartPoint::Standard(array![1.0]), ..FormOptions::default() };
        let err = form(&g, &t, &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputContractViolation);
    }

    #[test]
    // Purpose
    // -------
    // A vanishing gradient aborts the run with `NumericalDegeneracy`.
    //
    // Given
    // -----
    // - G(u) = ‖u‖² − 4 started at the origin, where ∇G = 0.
    //
    // Expect
    // ------
    // - `NumericalDegeneracy { iteration: 0, .. }` recovered from argmin.
    fn degenerate_gradient_is_an_error() {
        // Arrange
        let g = FnPerformance::new(|u: &Point| u.dot(u) - 4.0);
        let t = IdentityTransform::new(2).unwrap();

        // Act
        let err = form(&g, &t, &FormOptions::default()).unwrap_err();

        // Assert
        assert!(matches!(err, ReliabilityError::NumericalDegeneracy { iteration: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::NumericalDegeneracy);
    }

    #[test]
    fn history_is_recorded_on_request() {
        let g = sphere();
        let t = IdentityTransform::new(3).unwrap();
        let opts = FormOptions { record_history: true, ..FormOptions::default() };
        let out = form(&g, &t, &opts).unwrap();
        let history = out.history.expect("history was requested");
        assert_eq!(history.len(), out.iterations + 1);
        assert_eq!(history[0].point, Point::zeros(3));
        assert_eq!(history.last().unwrap(), &out.final_state);
    }
}

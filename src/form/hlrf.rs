//! form::hlrf — the Hasofer–Lind–Rackwitz–Fiessler design-point search.
//!
//! Purpose
//! -------
//! Provide the closed-form HLRF update and an `argmin` [`Solver`] that
//! iterates it, so that the search runs under argmin's `Executor` (iteration
//! ceiling, deadline, function-evaluation counters, observers).
//!
//! Key behaviors
//! -------------
//! - [`hlrf_step`]: `U_{k+1} = ((∇G_k·U_k − G_k) / ‖∇G_k‖²) ∇G_k`, the
//!   minimum-norm point on the tangent hyperplane of `G` at `U_k`.
//! - [`Hlrf::init`](Solver::init) evaluates `G` and `∇G` at the start point.
//! - Each [`next_iter`](Solver::next_iter) takes one step, evaluates the new
//!   state, computes `e1/e2/e3` against the previous state, and records which
//!   criteria hold.
//! - [`terminate`](Solver::terminate) reports `SolverConverged` once the
//!   configured [`ConvergencePolicy`] is met. The iteration ceiling and the
//!   deadline are left to the executor.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only the previous and current states are kept unless history recording
//!   is requested; all state is owned by the solver instance and dropped with
//!   it.
//! - A gradient with `‖∇G‖ ≤ DEGENERACY_EPS` aborts the run with
//!   `NumericalDegeneracy` before any division.
use argmin::core::{
    CostFunction, Error, Gradient, IterState, Problem, Solver, State, TerminationReason,
    TerminationStatus, KV,
};
use tracing::debug;

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    form::{
        options::{ConvergenceCriteria, ConvergencePolicy, Criterion},
        state::{IterationState, Residuals},
    },
    model::types::{Grad, Point},
    numerics::DEGENERACY_EPS,
};

/// Executor state used by [`Hlrf`]: parameter `U`, gradient `∇G`, cost `G`.
pub type HlrfState = IterState<Point, Grad, (), (), (), f64>;

/// hlrf_step — one closed-form HLRF update from `state`.
///
/// Errors
/// ------
/// - `ReliabilityError::NumericalDegeneracy` when `‖∇G(U_k)‖ ≤ DEGENERACY_EPS`.
pub fn hlrf_step(state: &IterationState) -> ReliabilityResult<Point> {
    let grad_norm = state.grad_norm();
    if grad_norm <= DEGENERACY_EPS {
        return Err(ReliabilityError::NumericalDegeneracy { iteration: state.index, grad_norm });
    }
    let scale = (state.gradient.dot(&state.point) - state.value) / (grad_norm * grad_norm);
    Ok(&state.gradient * scale)
}

/// HLRF solver for `argmin`.
///
/// Construct with [`Hlrf::new`], hand it to an `Executor` together with a
/// problem implementing `CostFunction<Param = Point, Output = f64>` and
/// `Gradient<Param = Point, Gradient = Grad>`, and read the final states back
/// from the optimization result.
#[derive(Debug, Clone)]
pub struct Hlrf {
    criteria: ConvergenceCriteria,
    policy: ConvergencePolicy,
    record_history: bool,
    previous: Option<IterationState>,
    current: Option<IterationState>,
    residuals: Option<Residuals>,
    satisfied: Vec<Criterion>,
    converged: bool,
    history: Vec<IterationState>,
}

impl Hlrf {
    pub fn new(
        criteria: ConvergenceCriteria, policy: ConvergencePolicy, record_history: bool,
    ) -> Self {
        Self {
            criteria,
            policy,
            record_history,
            previous: None,
            current: None,
            residuals: None,
            satisfied: Vec::new(),
            converged: false,
            history: Vec::new(),
        }
    }

    /// Most recent iterate; `None` before `init`.
    pub fn current(&self) -> Option<&IterationState> {
        self.current.as_ref()
    }

    /// Iterate preceding [`current`](Self::current); `None` until one update
    /// has been performed.
    pub fn previous(&self) -> Option<&IterationState> {
        self.previous.as_ref()
    }

    pub fn residuals(&self) -> Option<Residuals> {
        self.residuals
    }

    pub fn satisfied(&self) -> &[Criterion] {
        &self.satisfied
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// All iterates including the start point, when recording was enabled.
    pub fn history(&self) -> Option<&[IterationState]> {
        self.record_history.then_some(self.history.as_slice())
    }

    fn push_history(&mut self, state: &IterationState) {
        if self.record_history {
            self.history.push(state.clone());
        }
    }
}

impl<O> Solver<O, HlrfState> for Hlrf
where
    O: CostFunction<Param = Point, Output = f64> + Gradient<Param = Point, Gradient = Grad>,
{
    const NAME: &'static str = "HLRF";

    fn init(
        &mut self, problem: &mut Problem<O>, state: HlrfState,
    ) -> Result<(HlrfState, Option<KV>), Error> {
        let u0 = state
            .get_param()
            .ok_or(ReliabilityError::NotInitialized {
                text: "HLRF requires an initial point set via `state.param`.".to_string(),
            })?
            .clone();
        let value = problem.cost(&u0)?;
        let gradient = problem.gradient(&u0)?;
        let start = IterationState::new(0, u0, value, gradient.clone());
        debug!(beta = start.beta, value, grad_norm = start.grad_norm(), "HLRF start point");

        self.previous = None;
        self.residuals = None;
        self.satisfied.clear();
        self.converged = false;
        self.history.clear();
        self.push_history(&start);
        self.current = Some(start);
        Ok((state.cost(value).gradient(gradient), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: HlrfState,
    ) -> Result<(HlrfState, Option<KV>), Error> {
        let current = self.current.take().ok_or(ReliabilityError::NotInitialized {
            text: "HLRF iterated before initialization.".to_string(),
        })?;
        let next_point = match hlrf_step(&current) {
            Ok(point) => point,
            Err(err) => {
                self.current = Some(current);
                return Err(err.into());
            }
        };
        let value = problem.cost(&next_point)?;
        let gradient = problem.gradient(&next_point)?;
        let next =
            IterationState::new(current.index + 1, next_point.clone(), value, gradient.clone());

        let residuals = Residuals::between(&current, &next);
        self.satisfied = residuals.satisfied(&self.criteria);
        self.converged = self.policy.is_met(&self.satisfied, &self.criteria);
        self.residuals = Some(residuals);
        debug!(
            iteration = next.index,
            beta = next.beta,
            value,
            e1 = residuals.e1,
            e2 = residuals.e2,
            e3 = residuals.e3,
            converged = self.converged,
            "HLRF iteration"
        );

        self.push_history(&next);
        self.previous = Some(current);
        self.current = Some(next);
        Ok((state.param(next_point).cost(value).gradient(gradient), None))
    }

    fn terminate(&mut self, _state: &HlrfState) -> TerminationStatus {
        if self.converged {
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        } else {
            TerminationStatus::NotTerminated
        }
    }
}

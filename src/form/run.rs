//! Execution helper that runs the [`Hlrf`] solver on a standard-space model
//! and collects the final solver and executor state.
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    form::{
        hlrf::Hlrf,
        options::FormOptions,
        state::{ConvergenceStatus, IterationState},
    },
    model::{
        adapter::StandardSpaceModel,
        traits::{PerformanceFunction, SpaceTransform},
        types::{FnEvalMap, Point},
    },
};

/// Raw result of one executor run, before reporting.
#[derive(Debug, Clone)]
pub struct HlrfRun {
    pub final_state: IterationState,
    pub previous_state: Option<IterationState>,
    pub status: ConvergenceStatus,
    pub fn_evals: FnEvalMap,
    pub history: Option<Vec<IterationState>>,
}

/// Run HLRF from `u0` on `problem` under the executor limits in `opts`.
///
/// Wires up:
/// - the [`Hlrf`] solver with `opts.criteria`, `opts.policy`, and
///   `opts.record_history`,
/// - `max_iters(opts.max_iter)`; `0` returns the start point untouched,
/// - an optional wall-clock `timeout`,
/// - a terminal slog observer when `opts.verbose` is set and the `obs_slog`
///   feature is enabled, plus a one-time line with `G(U_0)` and `‖∇G(U_0)‖`.
///
/// # Errors
/// - Any error raised while evaluating `G` or `∇G`, recovered from the
///   `argmin` error through `From<argmin::core::Error>`.
/// - `ReliabilityError::NumericalDegeneracy` if the gradient vanishes before
///   convergence.
pub fn run_hlrf<G, T>(
    u0: Point, opts: &FormOptions, problem: StandardSpaceModel<'_, G, T>,
) -> ReliabilityResult<HlrfRun>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&u0, &problem)?;
    }
    let solver = Hlrf::new(opts.criteria, opts.policy, opts.record_history);
    let max_iter = opts.max_iter as u64;
    let mut executor =
        Executor::new(problem, solver).configure(|state| state.param(u0).max_iters(max_iter));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(timeout) = opts.timeout {
        executor = executor.timeout(timeout);
    }

    let result = executor.run()?;
    let state = result.state();
    let solver = result.solver();
    let iterations = state.get_iter() as usize;
    let fn_evals = state.get_func_counts().clone();
    let termination = format!("{:?}", state.get_termination_status());

    let final_state = solver.current().cloned().ok_or(ReliabilityError::PotentialBug {
        text: "HLRF finished without an initial state.".to_string(),
    })?;
    let status = ConvergenceStatus {
        converged: solver.converged(),
        iterations,
        satisfied: solver.satisfied().to_vec(),
        residuals: solver.residuals(),
        termination,
    };
    Ok(HlrfRun {
        final_state,
        previous_state: solver.previous().cloned(),
        status,
        fn_evals,
        history: solver.history().map(<[IterationState]>::to_vec),
    })
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<G, T>(
    u0: &Point, problem: &StandardSpaceModel<'_, G, T>,
) -> ReliabilityResult<()>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    let g0 = problem.value_at(u0)?;
    let g0n = problem.gradient_at(u0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: G(u0) = {:.6}{}",
        g0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}

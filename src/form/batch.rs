//! Independent FORM runs evaluated concurrently on the rayon pool.
//!
//! Each run owns its solver, its iteration states, and its executor; nothing
//! is shared between runs except read-only references to `g` and the
//! transform.
use rayon::prelude::*;
use tracing::debug;

use crate::{
    errors::ReliabilityResult,
    form::{
        api::{form, FormOutcome},
        options::{FormOptions, StartPoint},
    },
    model::traits::{PerformanceFunction, SpaceTransform},
};

/// form_multi_start — run [`form`] once per start point, in parallel.
///
/// The returned vector is in the same order as `starts`; each entry carries
/// its own success or failure. `opts.start` is ignored.
pub fn form_multi_start<G, T>(
    g: &G, transform: &T, starts: &[StartPoint], opts: &FormOptions,
) -> Vec<ReliabilityResult<FormOutcome>>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    debug!(runs = starts.len(), "FORM multi-start");
    starts
        .par_iter()
        .map(|start| {
            let run_opts = FormOptions { start: start.clone(), ..opts.clone() };
            form(g, transform, &run_opts)
        })
        .collect()
}

/// best_design_point — the converged outcome with the smallest `β`.
///
/// Failed and non-converged runs are skipped. Ties keep the earliest run.
pub fn best_design_point(results: &[ReliabilityResult<FormOutcome>]) -> Option<&FormOutcome> {
    results.iter().filter_map(|r| r.as_ref().ok()).filter(|out| out.converged).fold(
        None,
        |best: Option<&FormOutcome>, out| match best {
            Some(b) if b.beta <= out.beta => Some(b),
            _ => Some(out),
        },
    )
}

//! FORM: HLRF design-point search and first-order failure probability.
pub mod api;
pub mod batch;
pub mod hlrf;
pub mod options;
pub mod run;
pub mod state;

pub use self::{
    api::{form, FormOutcome},
    batch::{best_design_point, form_multi_start},
    hlrf::{hlrf_step, Hlrf},
    options::{
        ConvergenceCriteria, ConvergencePolicy, Criterion, FormOptions, StartPoint,
        DEFAULT_MAX_ITER, DEFAULT_TOL,
    },
    state::{ConvergenceStatus, DesignPoint, IterationState, Residuals},
};

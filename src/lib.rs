//! taylor_reliability — FORM/SORM structural reliability analysis.
//!
//! Purpose
//! -------
//! Estimate the probability that a performance function `G` falls below zero
//! with local Taylor approximations around the most probable failure point in
//! standard normal space: FORM linearizes `G` and locates the design point
//! with the Hasofer–Lind–Rackwitz–Fiessler (HLRF) iteration; SORM refines the
//! FORM probability with the principal curvatures of `G = 0` at that point.
//!
//! Key behaviors
//! -------------
//! - [`form::form`] runs HLRF under an `argmin` executor and returns the
//!   design point, `β_HL`, `Φ(−β_HL)`, and a convergence report.
//! - [`sorm::sorm`] evaluates the Hessian once at the design point, extracts
//!   curvatures, and applies Breitung's or Hohenbichler–Rackwitz's correction.
//! - [`form::form_multi_start`] runs independent FORM analyses on the rayon
//!   pool.
//! - Gradients and Hessians are analytical when the model provides them and
//!   finite-difference otherwise; the choice is made once per call.
//!
//! Invariants & assumptions
//! ------------------------
//! - Failure is `G < 0`; `G` is evaluated in physical space and composed with
//!   a [`model::SpaceTransform`] to reach standard normal space.
//! - `β_HL ≥ 0`, and every reported probability lies in `[0, 1]`.
//! - Non-convergence is a status flag, not an error. Degenerate gradients,
//!   missing capabilities, and invalid options are errors.
//!
//! Conventions
//! -----------
//! - Vectors and matrices are `ndarray` `f64` containers (see
//!   [`model::types`]).
//! - Errors are reported via [`errors::ReliabilityResult<T>`].
//! - Progress is emitted through `tracing`; the library installs no
//!   subscriber.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds end-to-end FORM →
//!   SORM scenarios.

pub mod derivatives;
pub mod errors;
pub mod form;
pub mod model;
pub mod numerics;
pub mod sorm;

/// Commonly used types and entry points.
pub mod prelude {
    pub use crate::{
        derivatives::{DerivativeMode, DiffScheme, FiniteDiffOptions, StepSize},
        errors::{ErrorKind, ReliabilityError, ReliabilityResult},
        form::{
            best_design_point, form, form_multi_start, ConvergenceCriteria, ConvergencePolicy,
            Criterion, DesignPoint, FormOptions, FormOutcome, StartPoint,
        },
        model::{
            types::{Grad, Hessian, Jacobian, Point},
            AffineTransform,
            FnPerformance,
            IdentityTransform,
            LinearPerformance,
            PerformanceFunction,
            SpaceTransform,
        },
        sorm::{sorm, sorm_from_hessian, SormFormula, SormOptions, SormOutcome, Validity},
    };
}

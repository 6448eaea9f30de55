//! sorm::api — the SORM entry points.
//!
//! Purpose
//! -------
//! Refine a completed FORM analysis with a curvature correction computed from
//! the Hessian of `G` at the design point.
//!
//! Key behaviors
//! -------------
//! - [`sorm`] resolves the Hessian strategy once, evaluates the Hessian at
//!   `U*` (the only Hessian evaluation of the analysis), and delegates to
//!   [`sorm_from_hessian`].
//! - [`sorm_from_hessian`] is a pure function over a design point and a
//!   Hessian.
//! - An invalid correction (`1 + β κ_i ≤ 0`, or `P_f ∉ [0, 1]`) is **not** an
//!   error here: the outcome carries a [`Validity`] tag and no probability,
//!   and the FORM result stays usable on its own.
//! - A non-converged FORM input is accepted with a `warn!` event;
//!   `form_converged` is copied into the outcome.
use ndarray::Array1;
use tracing::{info, warn};

use crate::{
    derivatives::options::{DerivativeMode, FiniteDiffOptions},
    errors::{ReliabilityError, ReliabilityResult},
    form::{api::FormOutcome, state::DesignPoint},
    model::{
        adapter::StandardSpaceModel,
        traits::{PerformanceFunction, SpaceTransform},
        types::Hessian,
    },
    numerics::generalized_beta,
    sorm::{correction::SormFormula, curvature::principal_curvatures},
};

/// Options for a SORM correction.
///
/// Default: Hessian by `Auto` (analytical when the performance function has
/// one and the transform is affine), central differences with step `0.01`,
/// Breitung's formula.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SormOptions {
    pub hessian: DerivativeMode,
    pub finite_diff: FiniteDiffOptions,
    pub formula: SormFormula,
}

/// Whether the second-order correction produced a trustworthy probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validity {
    Valid,
    /// `1 + β κ_index ≤ 0`; the quadratic approximation is not usable.
    InvalidCurvature { index: usize, curvature: f64, factor: f64 },
    /// The corrected probability left `[0, 1]`.
    ProbabilityOutOfRange { value: f64 },
}

/// Result of a SORM correction.
///
/// - `curvatures`: `κ_1 ≤ … ≤ κ_{n−1}`.
/// - `hessian`: the Hessian the curvatures were extracted from.
/// - `probability_of_failure`, `generalized_beta`: `Some` only when
///   `validity == Valid`; `β_G = −Φ⁻¹(P_f)`.
/// - `form_beta`, `form_probability`, `form_converged`: the FORM inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct SormOutcome {
    pub curvatures: Array1<f64>,
    pub hessian: Hessian,
    pub formula: SormFormula,
    pub probability_of_failure: Option<f64>,
    pub generalized_beta: Option<f64>,
    pub validity: Validity,
    pub form_beta: f64,
    pub form_probability: f64,
    pub form_converged: bool,
}

impl SormOutcome {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// sorm — second-order correction of a FORM result.
///
/// Parameters
/// ----------
/// - `g`, `transform`: the same model the FORM analysis ran on.
/// - `form`: a completed FORM outcome.
/// - `opts`: Hessian strategy and correction formula.
///
/// Errors
/// ------
/// - `MissingCapability` for an unsatisfiable analytical Hessian request.
/// - Hessian evaluation failures (model errors, non-finite entries).
/// - `NumericalDegeneracy` when `∇G(U*)` vanishes.
///
/// Invalid curvature is reported through [`SormOutcome::validity`].
pub fn sorm<G, T>(
    g: &G, transform: &T, form: &FormOutcome, opts: &SormOptions,
) -> ReliabilityResult<SormOutcome>
where
    G: PerformanceFunction,
    T: SpaceTransform,
{
    if !form.converged {
        warn!(
            iterations = form.iterations,
            beta = form.beta,
            "SORM applied to a non-converged FORM result"
        );
    }
    let model = StandardSpaceModel::new(g, transform, DerivativeMode::Auto, &opts.finite_diff)?;
    let source = model.resolve_hessian(opts.hessian, &opts.finite_diff)?;
    let hessian = model.hessian_at(&form.design_point.point, &source)?;
    sorm_from_hessian(&form.design_point, hessian, opts.formula)
}

/// sorm_from_hessian — curvatures and corrected probability from a given
/// Hessian at `design.point`.
///
/// # Errors
/// As [`principal_curvatures`]; correction failures become a [`Validity`] tag.
pub fn sorm_from_hessian(
    design: &DesignPoint, hessian: Hessian, formula: SormFormula,
) -> ReliabilityResult<SormOutcome> {
    let curvatures = principal_curvatures(design, &hessian)?;
    let beta = design.beta;

    let (probability_of_failure, validity) = match formula.apply(beta, &curvatures) {
        Ok(pf) => (Some(pf), Validity::Valid),
        Err(ReliabilityError::InvalidCurvature { index, curvature, factor }) => {
            warn!(index, curvature, factor, beta, "SORM correction factor is not positive");
            (None, Validity::InvalidCurvature { index, curvature, factor })
        }
        Err(ReliabilityError::ProbabilityOutOfRange { value }) => {
            warn!(value, beta, "SORM probability left the unit interval");
            (None, Validity::ProbabilityOutOfRange { value })
        }
        Err(err) => return Err(err),
    };
    let generalized_beta = probability_of_failure.map(generalized_beta);
    if let Some(pf) = probability_of_failure {
        info!(probability_of_failure = pf, curvatures = ?curvatures.to_vec(), "SORM corrected");
    }

    Ok(SormOutcome {
        curvatures,
        hessian,
        formula,
        probability_of_failure,
        generalized_beta,
        validity,
        form_beta: beta,
        form_probability: design.probability_of_failure(),
        form_converged: design.status.converged,
    })
}

//! Second-order probability corrections.
//!
//! - [`breitung`]: `P_f = Φ(−β) Π (1 + β κ_i)^(−1/2)`.
//! - [`hohenbichler_rackwitz`]: same product with `β` replaced by
//!   `ψ(β) = φ(β) / Φ(−β)`, which is more accurate at moderate `β`.
//!
//! A factor `1 + s κ_i ≤ 0` has no real square root; both formulas report it
//! as `InvalidCurvature` instead of returning `NaN`. A product that leaves
//! `[0, 1]` is reported as `ProbabilityOutOfRange`.
use std::str::FromStr;

use ndarray::Array1;

use crate::{
    errors::{ReliabilityError, ReliabilityResult},
    numerics::{form_probability, std_normal_pdf},
};

/// Which second-order correction to apply.
///
/// Parsing accepts `"breitung"` and `"hohenbichler_rackwitz"` / `"hr"`,
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SormFormula {
    #[default]
    Breitung,
    HohenbichlerRackwitz,
}

impl SormFormula {
    pub fn apply(&self, beta: f64, curvatures: &Array1<f64>) -> ReliabilityResult<f64> {
        match self {
            SormFormula::Breitung => breitung(beta, curvatures),
            SormFormula::HohenbichlerRackwitz => hohenbichler_rackwitz(beta, curvatures),
        }
    }
}

impl FromStr for SormFormula {
    type Err = ReliabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breitung" => Ok(SormFormula::Breitung),
            "hohenbichler_rackwitz" | "hohenbichlerrackwitz" | "hr" => {
                Ok(SormFormula::HohenbichlerRackwitz)
            }
            _ => Err(ReliabilityError::InvalidOptionName {
                option: "SORM formula",
                name: s.to_string(),
                reason: "Valid options are case insensitive 'breitung' or 'hohenbichler_rackwitz'.",
            }),
        }
    }
}

/// Breitung's asymptotic correction.
///
/// # Errors
/// - [`ReliabilityError::InvalidCurvature`] for the first `1 + β κ_i ≤ 0`.
/// - [`ReliabilityError::ProbabilityOutOfRange`] if the product leaves `[0, 1]`.
pub fn breitung(beta: f64, curvatures: &Array1<f64>) -> ReliabilityResult<f64> {
    corrected(form_probability(beta), beta, curvatures)
}

/// Hohenbichler–Rackwitz correction with `ψ(β) = φ(β) / Φ(−β)`.
///
/// # Errors
/// As for [`breitung`]; additionally `ProbabilityOutOfRange` when `Φ(−β)`
/// underflows to zero and `ψ` is undefined.
pub fn hohenbichler_rackwitz(beta: f64, curvatures: &Array1<f64>) -> ReliabilityResult<f64> {
    let pf_form = form_probability(beta);
    if pf_form <= 0.0 {
        return Err(ReliabilityError::ProbabilityOutOfRange { value: pf_form });
    }
    let psi = std_normal_pdf(beta) / pf_form;
    corrected(pf_form, psi, curvatures)
}

fn corrected(pf_form: f64, scale: f64, curvatures: &Array1<f64>) -> ReliabilityResult<f64> {
    let mut pf = pf_form;
    for (index, &curvature) in curvatures.iter().enumerate() {
        let factor = 1.0 + scale * curvature;
        if factor.is_nan() || factor <= 0.0 {
            return Err(ReliabilityError::InvalidCurvature { index, curvature, factor });
        }
        pf /= factor.sqrt();
    }
    if !(0.0..=1.0).contains(&pf) {
        return Err(ReliabilityError::ProbabilityOutOfRange { value: pf });
    }
    Ok(pf)
}

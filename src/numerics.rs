//! numerics — standard normal functions and shared thresholds.
//!
//! The CDF and quantile are written in terms of `erfc`/`erfc_inv` so that the
//! far tails (β ≳ 8) keep full relative precision instead of collapsing to
//! `1 - 1 = 0`.
use argmin_math::ArgminL2Norm;
use ndarray::Array1;
use statrs::{
    consts::SQRT_2PI,
    function::erf::{erfc, erfc_inv},
};
use std::f64::consts::SQRT_2;

/// Gradient norms at or below this value are treated as zero by HLRF.
pub const DEGENERACY_EPS: f64 = 1e-12;

/// Symmetric-eigen residual magnitude treated as zero when reporting curvatures.
pub const EIGEN_EPS: f64 = 1e-12;

/// Standard normal CDF Φ(x).
pub fn std_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal density φ(x).
pub fn std_normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / SQRT_2PI
}

/// Standard normal quantile Φ⁻¹(p) for `p ∈ (0, 1)`.
///
/// Returns `-∞` at `p = 0`, `+∞` at `p = 1`, and `NaN` outside `[0, 1]`.
pub fn std_normal_inv_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Euclidean norm of a dense vector.
pub fn l2_norm(v: &Array1<f64>) -> f64 {
    v.l2_norm()
}

/// FORM failure probability `P_f = Φ(-β)`.
pub fn form_probability(beta: f64) -> f64 {
    std_normal_cdf(-beta)
}

/// Generalized reliability index `β = -Φ⁻¹(P_f)`.
pub fn generalized_beta(pf: f64) -> f64 {
    -std_normal_inv_cdf(pf)
}

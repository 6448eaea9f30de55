//! SORM: principal curvatures at the design point and second-order
//! failure-probability corrections.
pub mod api;
pub mod correction;
pub mod curvature;

pub use self::{
    api::{sorm, sorm_from_hessian, SormOptions, SormOutcome, Validity},
    correction::{breitung, hohenbichler_rackwitz, SormFormula},
    curvature::principal_curvatures,
};

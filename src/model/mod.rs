//! Model layer: performance functions, space transforms, and the
//! standard-normal-space adapter consumed by FORM and SORM.
pub mod adapter;
pub mod functions;
pub mod traits;
pub mod transforms;
pub mod types;
pub mod validation;

pub use self::{
    adapter::StandardSpaceModel,
    functions::{FnPerformance, LinearPerformance},
    traits::{PerformanceFunction, SpaceTransform},
    transforms::{AffineTransform, IdentityTransform},
    types::{FnEvalMap, Grad, Hessian, Jacobian, Point},
};

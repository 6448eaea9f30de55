//! model::types — shared numeric aliases.
//!
//! All vectors and matrices are dense `ndarray` containers over `f64`.
//! `Point` and `Grad` have length `n` (the number of random variables);
//! `Hessian` and `Jacobian` are `n × n`.
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Point in standard normal (`u`) or physical (`x`) space.
pub type Point = Array1<f64>;

/// Gradient vector `∇G`, paired with the point it was evaluated at.
pub type Grad = Array1<f64>;

/// Dense symmetric matrix of second partial derivatives.
pub type Hessian = Array2<f64>;

/// Jacobian `∂x/∂u` of a space transform; row `j`, column `i` holds `∂x_j/∂u_i`.
pub type Jacobian = Array2<f64>;

/// Function-evaluation counters as reported by the argmin executor.
///
/// Maps counter names (e.g., `"cost_count"`, `"gradient_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

//! Numerical guards shared by the aggregation and growth equations.
//!
//! Every equation in the model is a chain of `exp`, `ln` and `powf` calls. A single
//! non-finite value poisons every stand aggregate computed afterwards, so intermediate
//! results are checked at the point they are produced and reported as
//! [`AcdError::Computation`].

use crate::errors::{AcdError, AcdResult};

/// Natural logarithm that rejects non-positive arguments.
pub fn checked_ln(value: f64, context: &str) -> AcdResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value.ln())
    } else {
        Err(AcdError::computation(
            context,
            format!("logarithm of non-positive or non-finite value {value}"),
        ))
    }
}

/// Pass `value` through if it is finite, otherwise fail with the given context.
pub fn ensure_finite(value: f64, context: &str) -> AcdResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AcdError::computation(
            context,
            format!("non-finite result {value}"),
        ))
    }
}

/// Standard logistic function `1 / (1 + e^-x)`.
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Ratio that yields zero for an empty denominator.
///
/// Used for stand means and fractions where an empty subset is a valid state
/// (no hardwoods, no trees above 10 cm).
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

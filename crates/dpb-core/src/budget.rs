//! Privacy-budget validation and splitting.
//!
//! # Basic Composition
//!
//! Running `n` mechanisms that are individually (ε_i, δ_i)-DP over the same
//! data is (Σε_i, Σδ_i)-DP. A bundle therefore hands every nested mechanism
//! the same share:
//!
//! - δ_i = δ / n
//! - ε_i = ε / n when ε < threshold, otherwise ε_i = threshold
//!
//! In the capped branch Σε_i may be less than the requested ε; the
//! remainder is left unspent.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use dpb_config::DEFAULT_EPSILON_THRESHOLD as EPSILON_THRESHOLD;

use crate::parameter::Parameter;
use crate::spec::{DELTA_INDEX, EPSILON_INDEX};
use crate::{Error, Result};

/// Uniform per-mechanism budget of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetSplit {
    pub epsilon_per_mechanism: f64,
    pub delta_per_mechanism: f64,
    /// Number of mechanisms sharing the budget.
    pub mechanisms: usize,
    /// Whether the epsilon share was capped at the threshold.
    pub capped: bool,
}

impl BudgetSplit {
    /// Total epsilon spent under basic composition.
    pub fn total_epsilon(&self) -> f64 {
        self.epsilon_per_mechanism * self.mechanisms as f64
    }

    /// Total delta spent under basic composition.
    pub fn total_delta(&self) -> f64 {
        self.delta_per_mechanism * self.mechanisms as f64
    }
}

/// Split `(epsilon, delta)` uniformly across `mechanisms` nested mechanisms.
///
/// Inputs are assumed validated (see [`validate_budget_parameters`]).
pub fn split_budget(
    epsilon: f64,
    delta: f64,
    mechanisms: usize,
    epsilon_threshold: f64,
) -> Result<BudgetSplit> {
    if mechanisms == 0 {
        return Err(Error::EmptyNestedSpecs);
    }

    let n = mechanisms as f64;
    let capped = epsilon >= epsilon_threshold;
    let epsilon_per_mechanism = if capped { epsilon_threshold } else { epsilon / n };
    let delta_per_mechanism = delta / n;

    if capped {
        warn!(
            requested_epsilon = epsilon,
            epsilon_threshold,
            mechanisms,
            "Epsilon at or above threshold; per-mechanism share capped"
        );
    }

    Ok(BudgetSplit {
        epsilon_per_mechanism,
        delta_per_mechanism,
        mechanisms,
        capped,
    })
}

/// Validate the global `[epsilon, delta]` parameters and read them out.
///
/// Checks run in a fixed order: count, epsilon type, delta type, epsilon
/// range, delta range.
pub fn validate_budget_parameters(parameters: &[Parameter]) -> Result<(f64, f64)> {
    if parameters.len() != 2 {
        return Err(Error::ParameterCount {
            actual: parameters.len(),
        });
    }

    let epsilon = numeric("epsilon", &parameters[EPSILON_INDEX])?;
    let delta = numeric("delta", &parameters[DELTA_INDEX])?;

    if epsilon.is_nan() || epsilon <= 0.0 {
        return Err(Error::NonPositiveEpsilon { value: epsilon });
    }
    if !(0.0..1.0).contains(&delta) {
        return Err(Error::DeltaOutOfRange { value: delta });
    }

    Ok((epsilon, delta))
}

fn numeric(name: &'static str, parameter: &Parameter) -> Result<f64> {
    parameter.as_f64().ok_or(Error::NonNumericParameter {
        name,
        dtype: parameter.dtype(),
    })
}

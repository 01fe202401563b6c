//! Bundle and nested mechanism specifications.
//!
//! A [`BundleSpec`] is what the pipeline hands to the factory: the ordered
//! nested mechanism specs and the two global parameters (epsilon, delta).
//! Specs load from JSON:
//!
//! ```json
//! {
//!   "nested_specs": [
//!     {"identifier": "dp_sum", "inputs": ["clicks"], "parameters": []}
//!   ],
//!   "parameters": [
//!     {"dtype": "f64", "value": 1.0},
//!     {"dtype": "f64", "value": 1e-6}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::parameter::Parameter;
use crate::Result;

/// Position of epsilon in [`BundleSpec::parameters`].
pub const EPSILON_INDEX: usize = 0;

/// Position of delta in [`BundleSpec::parameters`].
pub const DELTA_INDEX: usize = 1;

/// One nested mechanism in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismSpec {
    /// Identifier the resolver maps to a constructor.
    pub identifier: String,

    /// Names of the input streams the mechanism consumes, in order.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Mechanism-specific parameters, opaque to the bundle.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl MechanismSpec {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            inputs: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Declare the next input stream.
    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    /// Append a mechanism-specific parameter.
    pub fn with_parameter(mut self, parameter: impl Into<Parameter>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Number of input streams consumed per accumulate call.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

/// Specification of a whole bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleSpec {
    #[serde(default)]
    pub nested_specs: Vec<MechanismSpec>,

    /// Global parameters: `[epsilon, delta]`.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl BundleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a nested mechanism spec.
    pub fn with_nested(mut self, spec: MechanismSpec) -> Self {
        self.nested_specs.push(spec);
        self
    }

    /// Append a global parameter.
    pub fn with_parameter(mut self, parameter: impl Into<Parameter>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Set the global parameters to `[epsilon, delta]`.
    pub fn with_budget(mut self, epsilon: f64, delta: f64) -> Self {
        self.parameters = vec![Parameter::F64(epsilon), Parameter::F64(delta)];
        self
    }

    /// Nested identifiers in order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.nested_specs
            .iter()
            .map(|s| s.identifier.as_str())
            .collect()
    }

    /// Load a spec from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a spec from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

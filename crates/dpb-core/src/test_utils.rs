//! Test utilities for dpb-core.
//!
//! Reference mechanisms, a preloaded registry, spec builders, and the
//! assertion macros shared by unit and integration tests. Compiled for
//! `cfg(test)` and behind the `test-utils` feature.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::mechanism::{Aggregator, DpAggregator};
use crate::resolver::{MechanismFactory, MechanismRegistry};
use crate::spec::{BundleSpec, MechanismSpec};
use crate::{Error, Result};

// ============================================================================
// Macros
// ============================================================================

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that a Result is Err, optionally matching a pattern.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(_) => {}
        }
    };
    ($expr:expr, $pattern:pat) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err($pattern) => {}
            Err(e) => panic!(
                "Expected Err matching `{}`, got: {:?}",
                stringify!($pattern),
                e
            ),
        }
    };
}

/// Assert that two floating point numbers are approximately equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        $crate::assert_approx_eq!($a, $b, 1e-9_f64)
    };
    ($a:expr, $b:expr, $epsilon:expr) => {{
        let a: f64 = $a;
        let b: f64 = $b;
        let eps: f64 = $epsilon;
        let diff = (a - b).abs();
        if diff > eps || diff.is_nan() {
            panic!(
                "assertion failed: `(left ~= right)` (left: `{}`, right: `{}`, diff: `{}`, epsilon: `{}`)",
                a, b, diff, eps
            );
        }
    }};
}

// ============================================================================
// Reference mechanisms
// ============================================================================

/// Identifier of [`SumMechanism`] in [`test_registry`].
pub const DP_SUM: &str = "dp_sum";

/// Identifier of [`PlainSumAggregator`] in [`test_registry`].
pub const PLAIN_SUM: &str = "plain_sum";

/// DP-capable sum over `f64` inputs.
///
/// Reports `[sum, epsilon, delta]` so tests can see the budget each nested
/// mechanism received. No noise is added. The optional first mechanism
/// parameter sets the number of accumulate calls required before reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SumMechanism {
    pub sum: f64,
    pub count: u64,
    pub min_contributions: u64,
}

impl SumMechanism {
    pub fn new(min_contributions: u64) -> Self {
        Self {
            min_contributions,
            ..Self::default()
        }
    }
}

impl Aggregator<f64> for SumMechanism {
    fn accumulate(&mut self, inputs: &[f64]) -> Result<()> {
        self.sum += inputs.iter().sum::<f64>();
        self.count += 1;
        Ok(())
    }

    fn is_compatible(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<SumMechanism>()
            .is_some_and(|o| o.min_contributions == self.min_contributions)
    }

    fn merge_with(&mut self, other: &dyn Any) -> Result<()> {
        let other = other
            .downcast_ref::<SumMechanism>()
            .ok_or_else(|| Error::Incompatible("peer is not a dp_sum mechanism".to_string()))?;
        self.sum += other.sum;
        self.count += other.count;
        Ok(())
    }

    fn can_report(&self) -> bool {
        self.count >= self.min_contributions
    }

    fn serialize_state(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_dp(self: Box<Self>) -> Option<Box<dyn DpAggregator<f64>>> {
        Some(self)
    }
}

impl DpAggregator<f64> for SumMechanism {
    fn report_with_budget(self: Box<Self>, epsilon: f64, delta: f64) -> Result<Vec<f64>> {
        Ok(vec![self.sum, epsilon, delta])
    }
}

/// Sum without a DP contract; never admitted into a bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlainSumAggregator {
    pub sum: f64,
}

impl Aggregator<f64> for PlainSumAggregator {
    fn accumulate(&mut self, inputs: &[f64]) -> Result<()> {
        self.sum += inputs.iter().sum::<f64>();
        Ok(())
    }

    fn is_compatible(&self, other: &dyn Any) -> bool {
        other.is::<PlainSumAggregator>()
    }

    fn merge_with(&mut self, other: &dyn Any) -> Result<()> {
        let other = other
            .downcast_ref::<PlainSumAggregator>()
            .ok_or_else(|| Error::Incompatible("peer is not a plain_sum aggregator".to_string()))?;
        self.sum += other.sum;
        Ok(())
    }

    fn can_report(&self) -> bool {
        true
    }

    fn serialize_state(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds [`SumMechanism`] instances.
pub struct SumMechanismFactory;

impl MechanismFactory<f64> for SumMechanismFactory {
    fn create(&self, spec: &MechanismSpec) -> Result<Box<dyn Aggregator<f64>>> {
        let min_contributions = match spec.parameters.first() {
            None => 0,
            Some(p) => match p.as_f64() {
                Some(v) if v >= 0.0 => v as u64,
                _ => {
                    return Err(Error::Mechanism(format!(
                        "min_contributions must be a non-negative number, got {:?}",
                        p
                    )))
                }
            },
        };
        Ok(Box::new(SumMechanism::new(min_contributions)))
    }

    fn restore(&self, _spec: &MechanismSpec, blob: &[u8]) -> Result<Box<dyn Aggregator<f64>>> {
        let state: SumMechanism = serde_json::from_slice(blob)?;
        Ok(Box::new(state))
    }
}

/// Builds [`PlainSumAggregator`] instances.
pub struct PlainSumFactory;

impl MechanismFactory<f64> for PlainSumFactory {
    fn create(&self, _spec: &MechanismSpec) -> Result<Box<dyn Aggregator<f64>>> {
        Ok(Box::new(PlainSumAggregator::default()))
    }

    fn restore(&self, _spec: &MechanismSpec, blob: &[u8]) -> Result<Box<dyn Aggregator<f64>>> {
        let state: PlainSumAggregator = serde_json::from_slice(blob)?;
        Ok(Box::new(state))
    }
}

// ============================================================================
// Registry and spec builders
// ============================================================================

/// Registry with `dp_sum` and `plain_sum`.
pub fn test_registry() -> MechanismRegistry<f64> {
    let mut registry = MechanismRegistry::new();
    registry
        .register(DP_SUM, Box::new(SumMechanismFactory))
        .expect("register dp_sum");
    registry
        .register(PLAIN_SUM, Box::new(PlainSumFactory))
        .expect("register plain_sum");
    registry
}

/// `dp_sum` spec consuming `inputs` streams.
pub fn sum_spec(inputs: usize) -> MechanismSpec {
    (0..inputs).fold(MechanismSpec::new(DP_SUM), |spec, i| {
        spec.with_input(format!("x{}", i))
    })
}

/// `dp_sum` spec that cannot report before `min_contributions` calls.
pub fn gated_sum_spec(inputs: usize, min_contributions: i64) -> MechanismSpec {
    sum_spec(inputs).with_parameter(min_contributions)
}

/// Bundle of `dp_sum` mechanisms, one per entry of `inputs`.
pub fn sum_bundle_spec(inputs: &[usize], epsilon: f64, delta: f64) -> BundleSpec {
    inputs
        .iter()
        .fold(BundleSpec::new(), |spec, &n| spec.with_nested(sum_spec(n)))
        .with_budget(epsilon, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_mechanism_narrows_to_dp() {
        let boxed: Box<dyn Aggregator<f64>> = Box::new(SumMechanism::default());
        assert!(boxed.into_dp().is_some());

        let boxed: Box<dyn Aggregator<f64>> = Box::new(PlainSumAggregator::default());
        assert!(boxed.into_dp().is_none());
    }

    /// Implements `DpAggregator` but keeps the default narrowing.
    struct UnnarrowedSum(SumMechanism);

    impl Aggregator<f64> for UnnarrowedSum {
        fn accumulate(&mut self, inputs: &[f64]) -> Result<()> {
            self.0.accumulate(inputs)
        }
        fn is_compatible(&self, other: &dyn Any) -> bool {
            other.is::<UnnarrowedSum>()
        }
        fn merge_with(&mut self, _other: &dyn Any) -> Result<()> {
            Ok(())
        }
        fn can_report(&self) -> bool {
            true
        }
        fn serialize_state(&self) -> Result<Vec<u8>> {
            self.0.serialize_state()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl DpAggregator<f64> for UnnarrowedSum {
        fn report_with_budget(self: Box<Self>, epsilon: f64, delta: f64) -> Result<Vec<f64>> {
            Box::new(self.0).report_with_budget(epsilon, delta)
        }
    }

    #[test]
    fn test_dp_type_without_into_dp_override_is_rejected() {
        let boxed: Box<dyn Aggregator<f64>> = Box::new(UnnarrowedSum(SumMechanism::default()));
        assert!(boxed.into_dp().is_none());
    }

    #[test]
    fn test_registry_fixture_registers_both() {
        let registry = test_registry();
        assert_eq!(registry.identifiers(), vec![DP_SUM, PLAIN_SUM]);
    }

    #[test]
    fn test_gated_report() {
        let factory = SumMechanismFactory;
        let mut mech = factory.create(&gated_sum_spec(1, 2)).unwrap();
        assert!(!mech.can_report());
        mech.accumulate(&[1.0]).unwrap();
        mech.accumulate(&[1.0]).unwrap();
        assert!(mech.can_report());
    }

    #[test]
    fn test_bad_parameter_rejected() {
        let spec = sum_spec(1).with_parameter("many");
        assert!(SumMechanismFactory.create(&spec).is_err());
    }

    #[test]
    fn test_cross_type_merge_rejected() {
        let mut sum = SumMechanism::default();
        let plain = PlainSumAggregator::default();
        assert!(!sum.is_compatible(plain.as_any()));
        assert!(sum.merge_with(plain.as_any()).is_err());
    }

    #[test]
    fn test_sum_bundle_spec() {
        let spec = sum_bundle_spec(&[2, 0], 1.0, 0.5);
        assert_eq!(spec.identifiers(), vec![DP_SUM, DP_SUM]);
        assert_eq!(spec.nested_specs[0].inputs, vec!["x0", "x1"]);
        assert_eq!(spec.parameters.len(), 2);
    }
}

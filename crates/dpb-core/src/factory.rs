//! Bundle construction.
//!
//! [`BundleFactory`] turns a [`BundleSpec`] into a ready [`Bundle`], either
//! fresh or from a checkpoint. Validation runs in a fixed order and stops at
//! the first failure:
//!
//! 1. at least one nested spec
//! 2. (restore only) checkpoint entry count equals nested spec count, and
//!    the checkpoint's own checksums hold
//! 3. per nested spec, in order: checkpoint tag, resolution, DP capability
//! 4. exactly two global parameters
//! 5. epsilon numeric, then delta numeric
//! 6. epsilon > 0, then 0 <= delta < 1
//!
//! Nested mechanisms built before a failure are dropped.

use dpb_config::validate::validate_epsilon_threshold;
use dpb_config::BundleConfig;
use dpb_state::BundleState;
use tracing::{debug, info, warn};

use crate::budget::{split_budget, validate_budget_parameters, EPSILON_THRESHOLD};
use crate::bundle::Bundle;
use crate::mechanism::{Aggregator, DpAggregator};
use crate::resolver::MechanismResolver;
use crate::spec::BundleSpec;
use crate::{Error, Result};

/// Builds bundles against a resolver.
pub struct BundleFactory<'r, V> {
    resolver: &'r dyn MechanismResolver<V>,
    epsilon_threshold: f64,
}

impl<'r, V> BundleFactory<'r, V> {
    /// Factory with the default epsilon threshold.
    pub fn new(resolver: &'r dyn MechanismResolver<V>) -> Self {
        Self {
            resolver,
            epsilon_threshold: EPSILON_THRESHOLD,
        }
    }

    /// Factory using the threshold from a loaded configuration.
    pub fn with_config(resolver: &'r dyn MechanismResolver<V>, config: &BundleConfig) -> Self {
        Self::new(resolver).with_epsilon_threshold(config.epsilon_threshold)
    }

    /// Override the per-mechanism epsilon cap.
    ///
    /// The value is checked when a bundle is built.
    pub fn with_epsilon_threshold(mut self, threshold: f64) -> Self {
        self.epsilon_threshold = threshold;
        self
    }

    pub fn epsilon_threshold(&self) -> f64 {
        self.epsilon_threshold
    }

    /// Build a fresh bundle.
    pub fn create(&self, spec: &BundleSpec) -> Result<Bundle<V>> {
        self.logged(spec, "create", self.build(spec, None))
    }

    /// Rebuild a bundle from a checkpoint produced by [`Bundle::serialize`].
    pub fn restore(&self, spec: &BundleSpec, state: &BundleState) -> Result<Bundle<V>> {
        self.logged(spec, "restore", self.build(spec, Some(state)))
    }

    /// Decode checkpoint bytes and rebuild the bundle.
    pub fn restore_from_bytes(&self, spec: &BundleSpec, bytes: &[u8]) -> Result<Bundle<V>> {
        let result = BundleState::from_bytes(bytes)
            .map_err(Error::from)
            .and_then(|state| self.build(spec, Some(&state)));
        self.logged(spec, "restore", result)
    }

    fn logged(
        &self,
        spec: &BundleSpec,
        mode: &'static str,
        result: Result<Bundle<V>>,
    ) -> Result<Bundle<V>> {
        match &result {
            Ok(bundle) => info!(
                mode,
                mechanisms = bundle.num_mechanisms(),
                epsilon_per_mechanism = bundle.epsilon_per_mechanism(),
                delta_per_mechanism = bundle.delta_per_mechanism(),
                capped = bundle.budget().capped,
                total_inputs_seen = bundle.total_inputs_seen(),
                "Bundle constructed"
            ),
            Err(err) => warn!(
                mode,
                mechanisms = spec.nested_specs.len(),
                code = err.code(),
                kind = %err.kind(),
                error = %err,
                "Bundle construction failed"
            ),
        }
        result
    }

    fn build(&self, spec: &BundleSpec, state: Option<&BundleState>) -> Result<Bundle<V>> {
        validate_epsilon_threshold(self.epsilon_threshold)?;

        let count = spec.nested_specs.len();
        if count == 0 {
            return Err(Error::EmptyNestedSpecs);
        }

        if let Some(state) = state {
            if state.nested_count() != count {
                return Err(Error::StateMismatch(format!(
                    "expected {} nested states, got {}",
                    count,
                    state.nested_count()
                )));
            }
            state.validate()?;
        }

        let mut nested: Vec<Box<dyn DpAggregator<V>>> = Vec::with_capacity(count);
        let mut inputs_per_mechanism = Vec::with_capacity(count);

        for (index, nested_spec) in spec.nested_specs.iter().enumerate() {
            let identifier = &nested_spec.identifier;

            let resolved: Result<Box<dyn Aggregator<V>>> = match state {
                Some(state) => {
                    let entry = &state.nested[index];
                    if let Some(tag) = entry.identifier.as_deref() {
                        if tag != identifier {
                            return Err(Error::StateMismatch(format!(
                                "nested state {} belongs to '{}', spec expects '{}'",
                                index, tag, identifier
                            )));
                        }
                    }
                    self.resolver.resolve_from_state(nested_spec, &entry.blob)
                }
                None => self.resolver.resolve_fresh(nested_spec),
            };

            let aggregator = resolved.map_err(|err| Error::Resolution {
                index,
                identifier: identifier.clone(),
                reason: err.to_string(),
            })?;

            let dp = aggregator
                .into_dp()
                .ok_or_else(|| Error::NotDifferentiallyPrivate {
                    index,
                    identifier: identifier.clone(),
                })?;

            debug!(
                index,
                identifier = %identifier,
                inputs = nested_spec.input_count(),
                restored = state.is_some(),
                "Resolved nested mechanism"
            );

            nested.push(dp);
            inputs_per_mechanism.push(nested_spec.input_count());
        }

        let (epsilon, delta) = validate_budget_parameters(&spec.parameters)?;
        let budget = split_budget(epsilon, delta, count, self.epsilon_threshold)?;

        let identifiers = spec
            .nested_specs
            .iter()
            .map(|s| s.identifier.clone())
            .collect();
        let total_inputs_seen = state.map_or(0, |s| s.total_inputs_seen);

        Ok(Bundle::new(
            nested,
            identifiers,
            inputs_per_mechanism,
            budget,
            total_inputs_seen,
        ))
    }
}

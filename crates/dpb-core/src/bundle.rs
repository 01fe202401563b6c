//! The assembled bundle.
//!
//! A [`Bundle`] owns its nested DP mechanisms and forwards the aggregation
//! lifecycle to them. Its own state is small: the input arity of each
//! nested mechanism, the uniform per-mechanism budget fixed at construction,
//! and the number of accumulate calls absorbed so far.

use dpb_state::BundleState;
use tracing::{debug, trace};

use crate::budget::BudgetSplit;
use crate::mechanism::DpAggregator;
use crate::{Error, Result};

/// Several DP mechanisms acting as one aggregator under one budget.
pub struct Bundle<V> {
    nested: Vec<Box<dyn DpAggregator<V>>>,
    identifiers: Vec<String>,
    inputs_per_mechanism: Vec<usize>,
    budget: BudgetSplit,
    total_inputs_seen: u64,
}

impl<V> Bundle<V> {
    /// Assemble a bundle from already-validated parts.
    ///
    /// All vectors are parallel; the factory guarantees equal lengths.
    pub(crate) fn new(
        nested: Vec<Box<dyn DpAggregator<V>>>,
        identifiers: Vec<String>,
        inputs_per_mechanism: Vec<usize>,
        budget: BudgetSplit,
        total_inputs_seen: u64,
    ) -> Self {
        debug_assert_eq!(nested.len(), identifiers.len());
        debug_assert_eq!(nested.len(), inputs_per_mechanism.len());
        Self {
            nested,
            identifiers,
            inputs_per_mechanism,
            budget,
            total_inputs_seen,
        }
    }

    pub fn num_mechanisms(&self) -> usize {
        self.nested.len()
    }

    /// Spec identifiers of the nested mechanisms, in order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Input streams consumed by each nested mechanism per accumulate call.
    pub fn inputs_per_mechanism(&self) -> &[usize] {
        &self.inputs_per_mechanism
    }

    /// Total input values expected by [`accumulate`](Self::accumulate).
    pub fn expected_input_count(&self) -> usize {
        self.inputs_per_mechanism.iter().sum()
    }

    pub fn epsilon_per_mechanism(&self) -> f64 {
        self.budget.epsilon_per_mechanism
    }

    pub fn delta_per_mechanism(&self) -> f64 {
        self.budget.delta_per_mechanism
    }

    pub fn budget(&self) -> &BudgetSplit {
        &self.budget
    }

    /// Number of accumulate calls absorbed, including merged peers and
    /// restored checkpoints.
    pub fn total_inputs_seen(&self) -> u64 {
        self.total_inputs_seen
    }

    /// Feed one group of inputs to the nested mechanisms.
    ///
    /// `inputs` is split into consecutive slices, one per nested mechanism,
    /// sized by [`inputs_per_mechanism`](Self::inputs_per_mechanism). The
    /// counter moves only after every nested mechanism accepted its slice.
    /// A saturated counter fails the call before any nested mechanism sees
    /// the inputs. If a nested mechanism fails, earlier ones keep their
    /// update and the bundle should be discarded.
    pub fn accumulate(&mut self, inputs: &[V]) -> Result<()> {
        let expected = self.expected_input_count();
        if inputs.len() != expected {
            return Err(Error::InputCount {
                expected,
                actual: inputs.len(),
            });
        }

        let total = self.counter_after(1)?;

        let mut offset = 0;
        for (mechanism, &count) in self.nested.iter_mut().zip(&self.inputs_per_mechanism) {
            mechanism.accumulate(&inputs[offset..offset + count])?;
            offset += count;
        }

        self.total_inputs_seen = total;
        trace!(total_inputs_seen = self.total_inputs_seen, "Accumulated input group");
        Ok(())
    }

    fn counter_after(&self, added: u64) -> Result<u64> {
        self.total_inputs_seen
            .checked_add(added)
            .ok_or(Error::CounterOverflow {
                current: self.total_inputs_seen,
                added,
            })
    }

    /// Whether `other` has the same shape and budget, with pairwise
    /// compatible nested mechanisms.
    pub fn is_compatible(&self, other: &Bundle<V>) -> bool {
        self.incompatibility(other).is_none()
    }

    fn incompatibility(&self, other: &Bundle<V>) -> Option<String> {
        if self.nested.len() != other.nested.len() {
            return Some(format!(
                "expected {} nested mechanisms, got {}",
                self.nested.len(),
                other.nested.len()
            ));
        }
        if self.inputs_per_mechanism != other.inputs_per_mechanism {
            return Some(format!(
                "input arity mismatch: {:?} vs {:?}",
                self.inputs_per_mechanism, other.inputs_per_mechanism
            ));
        }
        if self.budget.epsilon_per_mechanism != other.budget.epsilon_per_mechanism
            || self.budget.delta_per_mechanism != other.budget.delta_per_mechanism
        {
            return Some(format!(
                "budget mismatch: ({}, {}) vs ({}, {})",
                self.budget.epsilon_per_mechanism,
                self.budget.delta_per_mechanism,
                other.budget.epsilon_per_mechanism,
                other.budget.delta_per_mechanism
            ));
        }
        for (index, (mine, theirs)) in self.nested.iter().zip(&other.nested).enumerate() {
            if !mine.is_compatible(theirs.as_any()) {
                return Some(format!(
                    "nested mechanism {} '{}' is not compatible",
                    index, self.identifiers[index]
                ));
            }
        }
        None
    }

    /// Merge a compatible peer bundle into this one.
    ///
    /// Compatibility and counter headroom are checked before any nested
    /// state changes.
    pub fn merge_with(&mut self, other: Bundle<V>) -> Result<()> {
        if let Some(reason) = self.incompatibility(&other) {
            return Err(Error::Incompatible(reason));
        }
        let total = self.counter_after(other.total_inputs_seen)?;

        for (mine, theirs) in self.nested.iter_mut().zip(&other.nested) {
            mine.merge_with(theirs.as_any())?;
        }

        self.total_inputs_seen = total;
        debug!(
            merged_inputs = other.total_inputs_seen,
            total_inputs_seen = self.total_inputs_seen,
            "Merged bundle"
        );
        Ok(())
    }

    /// Whether every nested mechanism can report.
    pub fn can_report(&self) -> bool {
        self.nested.iter().all(|m| m.can_report())
    }

    /// Consume the bundle and produce the outputs of every nested mechanism,
    /// concatenated in nested order. Each mechanism reports with the
    /// bundle's per-mechanism budget.
    pub fn report(self) -> Result<Vec<V>> {
        if let Some(index) = self.nested.iter().position(|m| !m.can_report()) {
            return Err(Error::NotReportable(format!(
                "nested mechanism {} '{}' cannot report",
                index, self.identifiers[index]
            )));
        }

        let epsilon = self.budget.epsilon_per_mechanism;
        let delta = self.budget.delta_per_mechanism;
        let mut outputs = Vec::new();
        for mechanism in self.nested {
            outputs.extend(mechanism.report_with_budget(epsilon, delta)?);
        }

        debug!(
            outputs = outputs.len(),
            epsilon_per_mechanism = epsilon,
            delta_per_mechanism = delta,
            "Bundle reported"
        );
        Ok(outputs)
    }

    /// Checkpoint the bundle: the input counter plus each nested state,
    /// tagged with its spec identifier.
    pub fn serialize(&self) -> Result<BundleState> {
        let mut state = BundleState::new(self.total_inputs_seen);
        for (identifier, mechanism) in self.identifiers.iter().zip(&self.nested) {
            state.push_nested(Some(identifier), mechanism.serialize_state()?);
        }
        debug!(
            nested = state.nested_count(),
            total_inputs_seen = self.total_inputs_seen,
            "Serialized bundle"
        );
        Ok(state)
    }

    /// Checkpoint straight to bytes.
    pub fn serialize_to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.serialize()?.to_bytes()?)
    }
}

impl<V> std::fmt::Debug for Bundle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("identifiers", &self.identifiers)
            .field("inputs_per_mechanism", &self.inputs_per_mechanism)
            .field("budget", &self.budget)
            .field("total_inputs_seen", &self.total_inputs_seen)
            .finish_non_exhaustive()
    }
}

//! Capability traits for nested mechanisms.
//!
//! Every nested mechanism is an [`Aggregator`]. Only those that also carry
//! an explicit privacy-accounting contract implement [`DpAggregator`], and
//! only those may be composed into a bundle. Resolvers hand back a generic
//! `Box<dyn Aggregator<V>>`; the factory narrows it with
//! [`Aggregator::into_dp`], which consumes the box and either returns the
//! same instance as a DP mechanism or drops it.
//!
//! `V` is the value type flowing through accumulate and report (a tensor in
//! a real pipeline). The bundle never inspects values.

use std::any::Any;

use crate::Result;

/// A mechanism that absorbs inputs and can be checkpointed.
pub trait Aggregator<V>: Send {
    /// Absorb one group of inputs.
    fn accumulate(&mut self, inputs: &[V]) -> Result<()>;

    /// Whether `other` can be merged into this mechanism.
    ///
    /// `other` is the peer's [`as_any`](Aggregator::as_any) view.
    fn is_compatible(&self, other: &dyn Any) -> bool;

    /// Merge the state of a compatible peer into this mechanism.
    fn merge_with(&mut self, other: &dyn Any) -> Result<()>;

    /// Whether the mechanism has enough state to produce a report.
    fn can_report(&self) -> bool;

    /// Opaque checkpoint of the mechanism's state.
    fn serialize_state(&self) -> Result<Vec<u8>>;

    /// Concrete-type view used for peer downcasts.
    fn as_any(&self) -> &dyn Any;

    /// Narrow to the DP capability, consuming the instance.
    ///
    /// Returns `None` (and drops `self`) for mechanisms without a DP
    /// contract. Every [`DpAggregator`] implementor must override this to
    /// return `Some(self)`.
    fn into_dp(self: Box<Self>) -> Option<Box<dyn DpAggregator<V>>> {
        None
    }
}

/// A mechanism with an (epsilon, delta)-DP guarantee on its report.
///
/// Implementing this trait is not enough to be admitted into a bundle: the
/// type must also override [`Aggregator::into_dp`] to return `Some(self)`.
/// Without that override the default narrowing returns `None` and the
/// factory rejects the mechanism as not differentially private.
///
/// ```ignore
/// impl Aggregator<f64> for MySum {
///     // ...
///     fn into_dp(self: Box<Self>) -> Option<Box<dyn DpAggregator<f64>>> {
///         Some(self)
///     }
/// }
///
/// impl DpAggregator<f64> for MySum {
///     fn report_with_budget(self: Box<Self>, epsilon: f64, delta: f64) -> Result<Vec<f64>> {
///         // ...
///     }
/// }
/// ```
pub trait DpAggregator<V>: Aggregator<V> {
    /// Produce the final DP output using the given budget.
    fn report_with_budget(self: Box<Self>, epsilon: f64, delta: f64) -> Result<Vec<V>>;
}

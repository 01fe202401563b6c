//! DP Aggregator Bundle Core Library
//!
//! This library composes several differentially private mechanisms into a
//! single aggregator that shares one (epsilon, delta) budget:
//! - Bundle specifications and typed parameters
//! - Capability traits for nested mechanisms
//! - Mechanism resolution through an injected registry
//! - Budget validation and basic-composition splitting
//! - Bundle construction, restore, and forwarding
//! - Structured logging setup
//!
//! # Example
//!
//! ```ignore
//! use dpb_core::{BundleFactory, BundleSpec, MechanismRegistry};
//!
//! let mut registry = MechanismRegistry::new();
//! registry.register("dp_sum", Box::new(MySumFactory))?;
//!
//! let spec = BundleSpec::from_file("bundle.json".as_ref())?;
//! let mut bundle = BundleFactory::new(&registry).create(&spec)?;
//! bundle.accumulate(&inputs)?;
//! let checkpoint = bundle.serialize_to_bytes()?;
//! ```

pub mod budget;
pub mod bundle;
pub mod error;
pub mod factory;
pub mod logging;
pub mod mechanism;
pub mod parameter;
pub mod resolver;
pub mod spec;

// Reference mechanisms and assertion macros for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use budget::{split_budget, validate_budget_parameters, BudgetSplit, EPSILON_THRESHOLD};
pub use bundle::Bundle;
pub use error::{Error, ErrorKind, Result};
pub use factory::BundleFactory;
pub use mechanism::{Aggregator, DpAggregator};
pub use parameter::{DataType, Parameter};
pub use resolver::{MechanismFactory, MechanismRegistry, MechanismResolver};
pub use spec::{BundleSpec, MechanismSpec, DELTA_INDEX, EPSILON_INDEX};

pub use dpb_config::{load_config, BundleConfig};
pub use dpb_state::BundleState;

//! Nested mechanism resolution.
//!
//! The factory never looks mechanisms up globally. It is handed a
//! [`MechanismResolver`], usually a [`MechanismRegistry`] populated at
//! startup, and asks it for fresh or restored instances.

use std::collections::HashMap;

use tracing::debug;

use crate::mechanism::Aggregator;
use crate::spec::MechanismSpec;
use crate::{Error, Result};

/// Produces nested mechanism instances from specs.
pub trait MechanismResolver<V> {
    /// Build a fresh instance for `spec.identifier`.
    fn resolve_fresh(&self, spec: &MechanismSpec) -> Result<Box<dyn Aggregator<V>>>;

    /// Rebuild an instance from a blob produced by
    /// [`Aggregator::serialize_state`].
    fn resolve_from_state(
        &self,
        spec: &MechanismSpec,
        blob: &[u8],
    ) -> Result<Box<dyn Aggregator<V>>>;
}

/// Constructor for one mechanism identifier.
pub trait MechanismFactory<V>: Send + Sync {
    fn create(&self, spec: &MechanismSpec) -> Result<Box<dyn Aggregator<V>>>;

    fn restore(&self, spec: &MechanismSpec, blob: &[u8]) -> Result<Box<dyn Aggregator<V>>>;
}

/// In-memory identifier → factory table.
pub struct MechanismRegistry<V> {
    factories: HashMap<String, Box<dyn MechanismFactory<V>>>,
}

impl<V> Default for MechanismRegistry<V> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<V> MechanismRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `identifier`.
    ///
    /// Fails if the identifier is taken.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        factory: Box<dyn MechanismFactory<V>>,
    ) -> Result<()> {
        let identifier = identifier.into();
        if self.factories.contains_key(&identifier) {
            return Err(Error::DuplicateMechanism { identifier });
        }
        debug!(identifier = %identifier, "Registered mechanism factory");
        self.factories.insert(identifier, factory);
        Ok(())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn lookup(&self, identifier: &str) -> Result<&dyn MechanismFactory<V>> {
        self.factories
            .get(identifier)
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::UnknownMechanism {
                identifier: identifier.to_string(),
            })
    }
}

impl<V> MechanismResolver<V> for MechanismRegistry<V> {
    fn resolve_fresh(&self, spec: &MechanismSpec) -> Result<Box<dyn Aggregator<V>>> {
        self.lookup(&spec.identifier)?.create(spec)
    }

    fn resolve_from_state(
        &self,
        spec: &MechanismSpec,
        blob: &[u8],
    ) -> Result<Box<dyn Aggregator<V>>> {
        self.lookup(&spec.identifier)?.restore(spec, blob)
    }
}

//! Instance cache: one constructed instance per identifier.
//!
//! Entries are written once and never replaced or evicted for the
//! lifetime of the container. Reads never block.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::value::Instance;

#[derive(Debug, Default)]
pub(crate) struct InstanceCache {
    instances: DashMap<String, Instance>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Instance> {
        self.instances.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// Stores `instance` unless `id` already has one, and returns the stored instance.
    pub fn insert(&self, id: &str, instance: Instance) -> Instance {
        match self.instances.entry(id.to_string()) {
            Entry::Occupied(existing) => {
                trace!(id, "Keeping existing cached instance");
                existing.get().clone()
            }
            Entry::Vacant(slot) => slot.insert(instance).value().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

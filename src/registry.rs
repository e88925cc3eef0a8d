//! Relation Registry - runtime descriptor storage and lookup

use std::sync::Arc;

use dashmap::DashMap;

use crate::descriptor::RelationDescriptor;
use crate::error::{KinshipError, KinshipResult};

/// Thread-safe registry mapping relation names to their descriptors
#[derive(Debug, Clone)]
pub struct RelationRegistry {
    relations: Arc<DashMap<String, Arc<RelationDescriptor>>>,
}

impl Default for RelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            relations: Arc::new(DashMap::new()),
        }
    }

    /// Register a relation descriptor, validating it first
    pub fn register(&self, descriptor: RelationDescriptor) -> KinshipResult<()> {
        descriptor.validate()?;

        if self.relations.contains_key(&descriptor.name) {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' is already registered",
                descriptor.name
            )));
        }

        self.relations
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Get a relation descriptor by name
    pub fn get(&self, name: &str) -> Option<Arc<RelationDescriptor>> {
        self.relations.get(name).map(|entry| entry.value().clone())
    }

    /// Check if a relation is registered
    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Get all registered relation names
    pub fn names(&self) -> Vec<String> {
        self.relations
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Remove all registered relations
    pub fn clear(&self) {
        self.relations.clear();
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        let total_relations = self.relations.len();
        let polymorphic_relations = self
            .relations
            .iter()
            .filter(|entry| entry.value().is_polymorphic())
            .count();
        let self_referential_relations = self
            .relations
            .iter()
            .filter(|entry| entry.value().self_referential)
            .count();

        RegistryStats {
            total_relations,
            polymorphic_relations,
            self_referential_relations,
        }
    }
}

/// Statistics about the relation registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_relations: usize,
    pub polymorphic_relations: usize,
    pub self_referential_relations: usize,
}

/// Global registry instance for the application
static GLOBAL_REGISTRY: std::sync::OnceLock<RelationRegistry> = std::sync::OnceLock::new();

/// Get the global relation registry
pub fn global_registry() -> &'static RelationRegistry {
    GLOBAL_REGISTRY.get_or_init(RelationRegistry::new)
}

/// Convenience macro for registering relations in the global registry
#[macro_export]
macro_rules! register_relation {
    ($descriptor:expr) => {
        $crate::registry::global_registry()
            .register($descriptor)
            .expect("Failed to register relation");
    };
}

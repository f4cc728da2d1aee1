//! Resource Registry - central registration of all resource kinds.
//!
//! The registry is populated once during startup and then sealed. After that
//! it is only read, so it can be shared between request handlers behind an
//! `Arc` without locking.
//!
//! When adding a new resource kind:
//! 1. Create the definition file in `definitions/`
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it here in `get_all_definitions()`

use std::collections::HashMap;

use tracing::{error, info};

use super::definitions::{
    MeshDefinition, ResourceWsDefinition, TrafficPermissionDefinition, TrafficRouteDefinition,
};
use super::error::RegistryError;

/// Get all built-in resource kinds, in registration order.
///
/// This is the central place where all resource kinds are registered.
/// When adding a new kind, add it here.
pub fn get_all_definitions() -> Vec<ResourceWsDefinition> {
    vec![
        ResourceWsDefinition::of::<MeshDefinition>(),
        ResourceWsDefinition::of::<TrafficRouteDefinition>(),
        ResourceWsDefinition::of::<TrafficPermissionDefinition>(),
    ]
}

/// Ordered set of resource kinds, indexed by path segment.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    /// Definitions in registration order.
    definitions: Vec<ResourceWsDefinition>,

    /// Key: path segment, Value: index into `definitions`.
    by_path: HashMap<String, usize>,

    sealed: bool,
}

impl ResourceRegistry {
    /// Create an empty, unsealed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in resource kind.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for definition in get_all_definitions() {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Register a resource kind.
    ///
    /// Fails if the path segment, display name or resource kind is already
    /// taken, if the definition is malformed, or if the registry has been
    /// sealed. A failed registration leaves the registry unchanged.
    ///
    /// Stores key resources by kind, so two paths may not serve the same kind.
    pub fn register(&mut self, definition: ResourceWsDefinition) -> Result<(), RegistryError> {
        if self.sealed {
            error!(
                "Attempted to register resource kind '{}' after the registry was sealed",
                definition.path
            );
            return Err(RegistryError::Sealed(definition.path));
        }

        validate_definition(&definition)?;

        if self.by_path.contains_key(&definition.path) {
            return Err(RegistryError::duplicate("path", definition.path));
        }
        if self.definitions.iter().any(|d| d.name == definition.name) {
            return Err(RegistryError::duplicate("name", definition.name));
        }
        let kind = definition.new_resource().kind();
        if self
            .definitions
            .iter()
            .any(|d| d.new_resource().kind() == kind)
        {
            return Err(RegistryError::duplicate("kind", kind));
        }

        info!(
            "Registering resource kind: {} (/{})",
            definition.name, definition.path
        );
        self.by_path
            .insert(definition.path.clone(), self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    /// Look up the resource kind served under `path`.
    pub fn lookup(&self, path: &str) -> Result<&ResourceWsDefinition, RegistryError> {
        self.by_path
            .get(path)
            .map(|&index| &self.definitions[index])
            .ok_or_else(|| RegistryError::not_found(path))
    }

    /// Iterate over all resource kinds in registration order.
    ///
    /// The iterator borrows the registry, so it can be recreated any number
    /// of times.
    pub fn list(&self) -> impl Iterator<Item = &ResourceWsDefinition> + Clone + '_ {
        self.definitions.iter()
    }

    /// Stop accepting registrations.
    pub fn seal(&mut self) {
        if !self.sealed {
            info!("Resource registry sealed with {} kinds", self.definitions.len());
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn validate_definition(definition: &ResourceWsDefinition) -> Result<(), RegistryError> {
    if definition.name.trim().is_empty() {
        return Err(RegistryError::invalid("name cannot be empty"));
    }
    if definition.path.is_empty() {
        return Err(RegistryError::invalid(format!(
            "path of '{}' cannot be empty",
            definition.name
        )));
    }
    if definition
        .path
        .chars()
        .any(|c| c == '/' || c.is_whitespace())
    {
        return Err(RegistryError::invalid(format!(
            "path '{}' must be a single URL segment",
            definition.path
        )));
    }
    Ok(())
}

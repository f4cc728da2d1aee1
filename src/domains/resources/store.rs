//! Resource storage.
//!
//! The API server hands the store an empty resource (or list) built by the
//! kind's factory. Reads populate it; writes persist it. The store only sees
//! resources through the erased [`Resource`] / [`ResourceList`] traits, so one
//! implementation serves every registered kind.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::ResourceError;
use super::model::{Resource, ResourceList, ResourceMeta};

/// Errors returned by a resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No resource with that name exists for the kind.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// A resource with that name already exists for the kind.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: String, name: String },

    /// A resource could not be converted to or from its stored form.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl StoreError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for resource storage backends.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Populate `resource` with the stored resource called `name`.
    async fn get(&self, resource: &mut dyn Resource, name: &str) -> StoreResult<()>;

    /// Append every stored resource of the list's kind, ordered by name.
    async fn list(&self, list: &mut dyn ResourceList) -> StoreResult<()>;

    /// Persist a new resource. Its metadata is updated with the stored version.
    async fn create(&self, resource: &mut dyn Resource) -> StoreResult<()>;

    /// Replace an existing resource. Its metadata is updated with the new version.
    async fn update(&self, resource: &mut dyn Resource) -> StoreResult<()>;

    /// Replace the resource, or create it if it does not exist, as one step.
    ///
    /// Returns `true` when the resource was created.
    async fn upsert(&self, resource: &mut dyn Resource) -> StoreResult<bool>;

    /// Remove the resource of `kind` called `name`.
    async fn delete(&self, kind: &str, name: &str) -> StoreResult<()>;
}

#[derive(Debug, Clone)]
struct StoredResource {
    meta: ResourceMeta,
    spec: serde_json::Value,
}

impl StoredResource {
    fn load_into(&self, resource: &mut dyn Resource) -> StoreResult<()> {
        resource.set_spec_json(self.spec.clone())?;
        resource.set_meta(self.meta.clone());
        Ok(())
    }
}

/// In-memory store, keyed by kind then name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: RwLock<HashMap<&'static str, BTreeMap<String, StoredResource>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get(&self, resource: &mut dyn Resource, name: &str) -> StoreResult<()> {
        let kind = resource.kind();
        let resources = self.resources.read().await;
        let stored = resources
            .get(kind)
            .and_then(|by_name| by_name.get(name))
            .ok_or_else(|| StoreError::not_found(kind, name))?;
        stored.load_into(resource)
    }

    async fn list(&self, list: &mut dyn ResourceList) -> StoreResult<()> {
        let resources = self.resources.read().await;
        let Some(by_name) = resources.get(list.kind()) else {
            return Ok(());
        };

        for stored in by_name.values() {
            let mut item = list.new_item();
            stored.load_into(item.as_mut())?;
            list.add_item(item)?;
        }
        Ok(())
    }

    async fn create(&self, resource: &mut dyn Resource) -> StoreResult<()> {
        let kind = resource.kind();
        let name = resource.meta().name.clone();
        let spec = resource.spec_json()?;

        let mut resources = self.resources.write().await;
        let by_name = resources.entry(kind).or_default();
        if by_name.contains_key(&name) {
            return Err(StoreError::already_exists(kind, name));
        }

        let now = Utc::now();
        let meta = ResourceMeta {
            name: name.clone(),
            version: 1,
            creation_time: now,
            modification_time: now,
        };
        debug!(kind, name = %name, "Created resource");
        by_name.insert(
            name,
            StoredResource {
                meta: meta.clone(),
                spec,
            },
        );
        resource.set_meta(meta);
        Ok(())
    }

    async fn update(&self, resource: &mut dyn Resource) -> StoreResult<()> {
        let kind = resource.kind();
        let name = resource.meta().name.clone();
        let spec = resource.spec_json()?;

        let mut resources = self.resources.write().await;
        let stored = resources
            .get_mut(kind)
            .and_then(|by_name| by_name.get_mut(&name))
            .ok_or_else(|| StoreError::not_found(kind, &name))?;

        stored.meta.version += 1;
        stored.meta.modification_time = Utc::now();
        stored.spec = spec;
        debug!(kind, name = %name, version = stored.meta.version, "Updated resource");
        resource.set_meta(stored.meta.clone());
        Ok(())
    }

    async fn upsert(&self, resource: &mut dyn Resource) -> StoreResult<bool> {
        let kind = resource.kind();
        let name = resource.meta().name.clone();
        let spec = resource.spec_json()?;

        let mut resources = self.resources.write().await;
        let by_name = resources.entry(kind).or_default();
        let now = Utc::now();

        let (meta, created) = match by_name.get_mut(&name) {
            Some(stored) => {
                stored.meta.version += 1;
                stored.meta.modification_time = now;
                stored.spec = spec;
                (stored.meta.clone(), false)
            }
            None => {
                let meta = ResourceMeta {
                    name: name.clone(),
                    version: 1,
                    creation_time: now,
                    modification_time: now,
                };
                by_name.insert(
                    name.clone(),
                    StoredResource {
                        meta: meta.clone(),
                        spec,
                    },
                );
                (meta, true)
            }
        };
        debug!(kind, name = %name, version = meta.version, created, "Upserted resource");
        resource.set_meta(meta);
        Ok(created)
    }

    async fn delete(&self, kind: &str, name: &str) -> StoreResult<()> {
        let mut resources = self.resources.write().await;
        resources
            .get_mut(kind)
            .and_then(|by_name| by_name.remove(name))
            .ok_or_else(|| StoreError::not_found(kind, name))?;
        debug!(kind, name, "Deleted resource");
        Ok(())
    }
}

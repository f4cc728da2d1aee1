//! Resource model shared by every resource kind.
//!
//! The server never knows the concrete type of the resources it serves. Each
//! kind is handled through the object-safe [`Resource`] and [`ResourceList`]
//! traits, and concrete kinds get both for free by describing their spec with
//! [`ResourceSpec`] and using [`TypedResource`] / [`TypedResourceList`].

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::error::ResourceError;

/// Metadata carried by every resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    /// Name of the resource, unique within its kind.
    pub name: String,

    /// Version of the stored resource. Zero until the resource is persisted.
    pub version: u64,

    /// When the resource was first created.
    pub creation_time: DateTime<Utc>,

    /// When the resource was last modified.
    pub modification_time: DateTime<Utc>,
}

impl ResourceMeta {
    /// Create metadata for a resource that has not been stored yet.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A single resource instance of some kind.
pub trait Resource: Debug + Send + Sync {
    /// The kind of this resource (e.g. `"TrafficRoute"`).
    fn kind(&self) -> &'static str;

    fn meta(&self) -> &ResourceMeta;

    fn set_meta(&mut self, meta: ResourceMeta);

    /// Serialize the kind-specific part of the resource.
    fn spec_json(&self) -> Result<serde_json::Value, ResourceError>;

    /// Replace the kind-specific part of the resource from JSON.
    fn set_spec_json(&mut self, spec: serde_json::Value) -> Result<(), ResourceError>;
}

/// A collection of resources of a single kind.
pub trait ResourceList: Debug + Send + Sync {
    /// The kind of the items in this list.
    fn kind(&self) -> &'static str;

    fn items(&self) -> Vec<&dyn Resource>;

    /// Create an empty item of this list's kind, ready to be populated.
    fn new_item(&self) -> Box<dyn Resource>;

    /// Append an item. Items of another kind are rejected.
    fn add_item(&mut self, item: Box<dyn Resource>) -> Result<(), ResourceError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The kind-specific payload of a resource.
pub trait ResourceSpec:
    Debug + Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The kind name reported by resources carrying this spec.
    const KIND: &'static str;
}

/// A resource of a concrete kind.
#[derive(Debug, Clone, Default)]
pub struct TypedResource<S: ResourceSpec> {
    pub meta: ResourceMeta,
    pub spec: S,
}

impl<S: ResourceSpec> TypedResource<S> {
    pub fn new(name: impl Into<String>, spec: S) -> Self {
        Self {
            meta: ResourceMeta::named(name),
            spec,
        }
    }
}

impl<S: ResourceSpec> Resource for TypedResource<S> {
    fn kind(&self) -> &'static str {
        S::KIND
    }

    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }

    fn set_meta(&mut self, meta: ResourceMeta) {
        self.meta = meta;
    }

    fn spec_json(&self) -> Result<serde_json::Value, ResourceError> {
        serde_json::to_value(&self.spec).map_err(|e| ResourceError::invalid_spec(S::KIND, e))
    }

    fn set_spec_json(&mut self, spec: serde_json::Value) -> Result<(), ResourceError> {
        self.spec =
            serde_json::from_value(spec).map_err(|e| ResourceError::invalid_spec(S::KIND, e))?;
        Ok(())
    }
}

/// A list of resources of a concrete kind.
#[derive(Debug, Clone, Default)]
pub struct TypedResourceList<S: ResourceSpec> {
    pub items: Vec<TypedResource<S>>,
}

impl<S: ResourceSpec> ResourceList for TypedResourceList<S> {
    fn kind(&self) -> &'static str {
        S::KIND
    }

    fn items(&self) -> Vec<&dyn Resource> {
        self.items.iter().map(|item| item as &dyn Resource).collect()
    }

    fn new_item(&self) -> Box<dyn Resource> {
        Box::new(TypedResource::<S>::default())
    }

    fn add_item(&mut self, item: Box<dyn Resource>) -> Result<(), ResourceError> {
        if item.kind() != S::KIND {
            return Err(ResourceError::kind_mismatch(S::KIND, item.kind()));
        }

        // Same kind, so the spec JSON has the shape of S.
        let mut typed = TypedResource::<S>::default();
        typed.set_spec_json(item.spec_json()?)?;
        typed.set_meta(item.meta().clone());
        self.items.push(typed);
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// JSON representation of a resource as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub version: u64,
    pub creation_time: DateTime<Utc>,
    pub modification_time: DateTime<Utc>,
    pub spec: serde_json::Value,
}

impl ResourceView {
    /// Build the API view of a resource.
    pub fn from_resource(resource: &dyn Resource) -> Result<Self, ResourceError> {
        let meta = resource.meta();
        Ok(Self {
            kind: resource.kind().to_string(),
            name: meta.name.clone(),
            version: meta.version,
            creation_time: meta.creation_time,
            modification_time: meta.modification_time,
            spec: resource.spec_json()?,
        })
    }
}

/// JSON representation of a resource list as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceListView {
    pub total: usize,
    pub items: Vec<ResourceView>,
}

impl ResourceListView {
    pub fn from_list(list: &dyn ResourceList) -> Result<Self, ResourceError> {
        let items = list
            .items()
            .into_iter()
            .map(ResourceView::from_resource)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            total: items.len(),
            items,
        })
    }
}

//! Resource definitions module.
//!
//! Each resource kind is defined in its own file with:
//! - Its spec type (the kind-specific payload)
//! - Display name and URL path segment
//!
//! ## Adding a New Resource Kind
//!
//! 1. Create a new file (e.g., `my_kind.rs`)
//! 2. Define the spec and implement `ResourceSpec` for it
//! 3. Implement the `ResourceDefinition` trait
//! 4. Export it here
//! 5. Register in `registry.rs`

mod mesh;
mod traffic_permission;
mod traffic_route;

use std::fmt;
use std::sync::Arc;

use super::model::{Resource, ResourceList, ResourceSpec, TypedResource, TypedResourceList};

pub use mesh::{MeshDefinition, MeshMtls, MeshResource, MeshResourceList, MeshSpec};
pub use traffic_permission::{
    TrafficPermissionDefinition, TrafficPermissionResource, TrafficPermissionResourceList,
    TrafficPermissionSpec,
};
pub use traffic_route::{
    TrafficRouteDefinition, TrafficRouteDestination, TrafficRouteResource,
    TrafficRouteResourceList, TrafficRouteSpec,
};

/// Trait for resource kind definitions.
///
/// Each kind implements this trait to provide its metadata and spec type.
pub trait ResourceDefinition {
    /// Human-readable name of the kind.
    const NAME: &'static str;

    /// URL path segment under which the kind is served.
    const PATH: &'static str;

    /// The kind-specific payload.
    type Spec: ResourceSpec;
}

/// Produces a fresh, empty resource of one kind.
pub type ResourceFactory = Arc<dyn Fn() -> Box<dyn Resource> + Send + Sync>;

/// Produces a fresh, empty resource list of one kind.
pub type ResourceListFactory = Arc<dyn Fn() -> Box<dyn ResourceList> + Send + Sync>;

/// A resource kind as registered with the API server.
#[derive(Clone)]
pub struct ResourceWsDefinition {
    /// Display name, unique across the registry.
    pub name: String,

    /// URL path segment, unique across the registry.
    pub path: String,

    pub resource_factory: ResourceFactory,

    pub resource_list_factory: ResourceListFactory,
}

impl ResourceWsDefinition {
    /// Create a definition from explicit factories.
    pub fn new<F, L>(
        name: impl Into<String>,
        path: impl Into<String>,
        resource_factory: F,
        resource_list_factory: L,
    ) -> Self
    where
        F: Fn() -> Box<dyn Resource> + Send + Sync + 'static,
        L: Fn() -> Box<dyn ResourceList> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            path: path.into(),
            resource_factory: Arc::new(resource_factory),
            resource_list_factory: Arc::new(resource_list_factory),
        }
    }

    /// Build the definition of a statically known kind.
    pub fn of<D: ResourceDefinition>() -> Self {
        Self::new(
            D::NAME,
            D::PATH,
            || Box::new(TypedResource::<D::Spec>::default()),
            || Box::new(TypedResourceList::<D::Spec>::default()),
        )
    }

    /// Create an empty resource of this kind.
    pub fn new_resource(&self) -> Box<dyn Resource> {
        (self.resource_factory)()
    }

    /// Create an empty resource list of this kind.
    pub fn new_resource_list(&self) -> Box<dyn ResourceList> {
        (self.resource_list_factory)()
    }
}

impl fmt::Debug for ResourceWsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceWsDefinition")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

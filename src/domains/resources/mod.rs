//! Resources domain module.
//!
//! This module holds everything the API server knows about resource kinds.
//! Kinds are not related by a common base type: each one contributes a
//! definition with a pair of factories, and the generic server works on the
//! empty values those factories produce.
//!
//! ## Architecture
//!
//! - `model.rs` - `Resource` / `ResourceList` traits and their typed implementations
//! - `definitions/` - Individual resource kinds (one file per kind)
//! - `registry.rs` - Central registration of resource kinds
//! - `dispatch.rs` - Read-only-aware request dispatch policy
//! - `store.rs` - Resource storage trait and in-memory store
//!
//! ## Adding a New Resource Kind
//!
//! 1. Create a new file in `definitions/` (e.g., `my_kind.rs`)
//! 2. Implement `ResourceSpec` and `ResourceDefinition`
//! 3. Export in `definitions/mod.rs`
//! 4. Register in `registry.rs`
//!
//! **No need to modify the server or the HTTP transport!**

pub mod definitions;
mod dispatch;
mod error;
mod model;
mod registry;
mod store;

pub use definitions::{
    MeshDefinition, ResourceDefinition, ResourceWsDefinition, TrafficPermissionDefinition,
    TrafficRouteDefinition,
};
pub use dispatch::{Dispatch, DispatchPolicy, DispatchRejection, Target, Verb};
pub use error::{RegistryError, ResourceError};
pub use model::{
    Resource, ResourceList, ResourceListView, ResourceMeta, ResourceSpec, ResourceView,
    TypedResource, TypedResourceList,
};
pub use registry::{ResourceRegistry, get_all_definitions};
pub use store::{MemoryStore, ResourceStore, StoreError, StoreResult};

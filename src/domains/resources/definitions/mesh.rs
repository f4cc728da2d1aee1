//! Mesh resource definition.

use serde::{Deserialize, Serialize};

use super::ResourceDefinition;
use crate::domains::resources::model::{ResourceSpec, TypedResource, TypedResourceList};

/// Mesh-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSpec {
    #[serde(default)]
    pub mtls: MeshMtls,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshMtls {
    #[serde(default)]
    pub enabled: bool,
}

impl ResourceSpec for MeshSpec {
    const KIND: &'static str = "Mesh";
}

pub type MeshResource = TypedResource<MeshSpec>;
pub type MeshResourceList = TypedResourceList<MeshSpec>;

/// Mesh kind, served under `/meshes`.
pub struct MeshDefinition;

impl ResourceDefinition for MeshDefinition {
    const NAME: &'static str = "Mesh";
    const PATH: &'static str = "meshes";
    type Spec = MeshSpec;
}

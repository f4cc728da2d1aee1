//! Traffic permission resource definition.

use serde::{Deserialize, Serialize};

use super::ResourceDefinition;
use crate::domains::resources::model::{ResourceSpec, TypedResource, TypedResourceList};

/// Allows traffic from a set of sources to a set of destinations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficPermissionSpec {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub destinations: Vec<String>,
}

impl ResourceSpec for TrafficPermissionSpec {
    const KIND: &'static str = "TrafficPermission";
}

pub type TrafficPermissionResource = TypedResource<TrafficPermissionSpec>;
pub type TrafficPermissionResourceList = TypedResourceList<TrafficPermissionSpec>;

/// Traffic permission kind, served under `/traffic-permissions`.
pub struct TrafficPermissionDefinition;

impl ResourceDefinition for TrafficPermissionDefinition {
    const NAME: &'static str = "Traffic Permission";
    const PATH: &'static str = "traffic-permissions";
    type Spec = TrafficPermissionSpec;
}

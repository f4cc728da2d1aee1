//! Traffic route resource definition.

use serde::{Deserialize, Serialize};

use super::ResourceDefinition;
use crate::domains::resources::model::{ResourceSpec, TypedResource, TypedResourceList};

/// Routing rule splitting traffic between destinations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficRouteSpec {
    /// Service tags the route applies to.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Weighted destinations.
    #[serde(default)]
    pub destinations: Vec<TrafficRouteDestination>,
}

/// A single weighted destination of a traffic route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficRouteDestination {
    pub service: String,
    #[serde(default)]
    pub weight: u32,
}

impl ResourceSpec for TrafficRouteSpec {
    const KIND: &'static str = "TrafficRoute";
}

pub type TrafficRouteResource = TypedResource<TrafficRouteSpec>;
pub type TrafficRouteResourceList = TypedResourceList<TrafficRouteSpec>;

/// Traffic route kind, served under `/traffic-routes`.
pub struct TrafficRouteDefinition;

impl ResourceDefinition for TrafficRouteDefinition {
    const NAME: &'static str = "Traffic Route";
    const PATH: &'static str = "traffic-routes";
    type Spec = TrafficRouteSpec;
}

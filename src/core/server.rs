//! API server implementation and lifecycle management.
//!
//! `ApiServer` ties together the validated configuration, the sealed resource
//! registry and the resource store. Every request goes through the dispatch
//! policy first; only accepted requests reach the store.
//!
//! ## Lifecycle
//!
//! `NotStarted -> Running`. The transition happens in [`ApiServer::start`],
//! which validates the configuration. There is no way back.

use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::{Error, Result};
use crate::domains::resources::{
    DispatchPolicy, DispatchRejection, Resource, ResourceError, ResourceListView, ResourceMeta,
    ResourceRegistry, ResourceStore, ResourceView, StoreError, Target, Verb,
};

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Running,
}

/// The API server.
///
/// Cheap to clone; clones share configuration, registry and store.
#[derive(Clone)]
pub struct ApiServer {
    config: Arc<Config>,
    registry: Arc<ResourceRegistry>,
    store: Arc<dyn ResourceStore>,
    state: ServerState,
}

/// Outcome of a request that was accepted and served.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// A single resource, with the status to report (200 or 201).
    Item {
        status: StatusCode,
        resource: ResourceView,
    },
    /// A list of resources.
    Collection(ResourceListView),
    /// The resource was deleted.
    Deleted,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Item { status, .. } => *status,
            Self::Collection(_) | Self::Deleted => StatusCode::OK,
        }
    }
}

/// Client-facing failure of a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Refused by the dispatch policy before touching storage.
    #[error(transparent)]
    Rejected(#[from] DispatchRejection),

    /// The request body or path is not acceptable.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The store refused or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored resource could not be rendered.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// HTTP status reported for the error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(rejection) => rejection.status(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            Self::Store(StoreError::Resource(_)) | Self::Resource(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short title used in error bodies.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Rejected(DispatchRejection::UnknownKind(_)) => "Unknown resource kind",
            Self::Rejected(DispatchRejection::ReadOnly { .. }) => "Server is read-only",
            Self::BadRequest(_) => "Bad request",
            Self::Store(StoreError::NotFound { .. }) => "Resource not found",
            Self::Store(StoreError::AlreadyExists { .. }) => "Resource already exists",
            Self::Store(StoreError::Resource(_)) | Self::Resource(_) => "Internal server error",
        }
    }
}

/// Body accepted by create and update requests.
#[derive(Debug, Clone, Deserialize)]
struct ResourceBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    #[serde(default = "empty_spec")]
    spec: serde_json::Value,
}

fn empty_spec() -> serde_json::Value {
    serde_json::json!({})
}

/// Discovery document listing the served resource kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexView {
    pub name: String,
    pub version: String,
    pub read_only: bool,
    pub resources: Vec<KindView>,
}

/// A served resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindView {
    pub name: String,
    pub path: String,
}

impl ApiServer {
    /// Create a server over `registry` and `store`.
    ///
    /// The registry is sealed here; no kinds can be added afterwards.
    pub fn new(
        config: Config,
        mut registry: ResourceRegistry,
        store: Arc<dyn ResourceStore>,
    ) -> Self {
        registry.seal();
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            store,
            state: ServerState::NotStarted,
        }
    }

    /// Validate the configuration and move to `Running`.
    pub fn start(&mut self) -> Result<()> {
        if self.state == ServerState::Running {
            return Err(Error::AlreadyRunning);
        }
        self.config.api_server.validate()?;
        self.state = ServerState::Running;
        info!(
            port = self.config.api_server.port,
            read_only = self.config.api_server.read_only,
            kinds = self.registry.len(),
            "API server started"
        );
        Ok(())
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Describe the server and every served kind, in registration order.
    pub fn index(&self) -> IndexView {
        IndexView {
            name: self.name().to_string(),
            version: self.version().to_string(),
            read_only: self.config.api_server.read_only,
            resources: self
                .registry
                .list()
                .map(|d| KindView {
                    name: d.name.clone(),
                    path: d.path.clone(),
                })
                .collect(),
        }
    }

    /// Serve `verb` against the kind under `path`.
    ///
    /// `name` is the resource name from the URL, if any. `body` is only read
    /// for create and update, and only after the dispatch policy accepted the
    /// request.
    #[instrument(skip(self, body))]
    pub async fn handle(
        &self,
        verb: Verb,
        path: &str,
        name: Option<&str>,
        body: &[u8],
    ) -> std::result::Result<ApiResponse, ApiError> {
        let dispatch =
            DispatchPolicy::new(&self.registry, &self.config.api_server).decide(verb, path)?;

        let result = match (dispatch.verb, dispatch.target) {
            (Verb::List, Target::Collection(mut list)) => {
                self.store.list(list.as_mut()).await?;
                Ok(ApiResponse::Collection(ResourceListView::from_list(
                    list.as_ref(),
                )?))
            }
            (Verb::Get, Target::Instance(mut resource)) => {
                let name = require_name(name)?;
                self.store.get(resource.as_mut(), name).await?;
                item(StatusCode::OK, resource.as_ref())
            }
            (Verb::Create, Target::Instance(mut resource)) => {
                let body = parse_body(body, resource.as_ref())?;
                let name = require_name(body.name.as_deref())?.to_string();
                fill(resource.as_mut(), name, body.spec)?;
                self.store.create(resource.as_mut()).await?;
                item(StatusCode::CREATED, resource.as_ref())
            }
            (Verb::Update, Target::Instance(mut resource)) => {
                let name = require_name(name)?;
                let body = parse_body(body, resource.as_ref())?;
                if let Some(body_name) = &body.name {
                    if body_name != name {
                        return Err(ApiError::bad_request(format!(
                            "name '{body_name}' does not match '{name}'"
                        )));
                    }
                }
                fill(resource.as_mut(), name.to_string(), body.spec)?;
                let status = if self.store.upsert(resource.as_mut()).await? {
                    StatusCode::CREATED
                } else {
                    StatusCode::OK
                };
                item(status, resource.as_ref())
            }
            (Verb::Delete, Target::Instance(resource)) => {
                let name = require_name(name)?;
                self.store.delete(resource.kind(), name).await?;
                Ok(ApiResponse::Deleted)
            }
            (verb, _) => Err(ApiError::bad_request(format!(
                "{verb} is not supported on this path"
            ))),
        };

        if let Err(ApiError::Store(StoreError::Resource(e)) | ApiError::Resource(e)) = &result {
            warn!("Failed to serve {} {}: {}", verb, path, e);
        }
        result
    }
}

/// A resource name must be addressable as a single URL segment.
fn require_name(name: Option<&str>) -> std::result::Result<&str, ApiError> {
    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("resource name is required"))?;
    if name.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(ApiError::bad_request(format!(
            "resource name '{name}' must be a single URL segment"
        )));
    }
    Ok(name)
}

fn parse_body(
    body: &[u8],
    resource: &dyn Resource,
) -> std::result::Result<ResourceBody, ApiError> {
    let body: ResourceBody = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;

    if let Some(kind) = &body.kind {
        if kind != resource.kind() {
            return Err(ApiError::bad_request(format!(
                "type '{}' does not match '{}'",
                kind,
                resource.kind()
            )));
        }
    }
    Ok(body)
}

fn fill(
    resource: &mut dyn Resource,
    name: String,
    spec: serde_json::Value,
) -> std::result::Result<(), ApiError> {
    resource
        .set_spec_json(spec)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    resource.set_meta(ResourceMeta::named(name));
    Ok(())
}

fn item(
    status: StatusCode,
    resource: &dyn Resource,
) -> std::result::Result<ApiResponse, ApiError> {
    Ok(ApiResponse::Item {
        status,
        resource: ResourceView::from_resource(resource)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ApiServerConfig;
    use crate::domains::resources::{MemoryStore, ResourceWsDefinition, TrafficRouteDefinition};

    fn server(read_only: bool) -> ApiServer {
        let config = Config {
            api_server: ApiServerConfig {
                port: 0,
                read_only,
            },
            ..Default::default()
        };
        let mut server = ApiServer::new(
            config,
            ResourceRegistry::with_defaults().unwrap(),
            Arc::new(MemoryStore::new()),
        );
        server.start().unwrap();
        server
    }

    fn route_body(name: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": "TrafficRoute",
            "name": name,
            "spec": { "sources": ["web"], "destinations": [{ "service": "api", "weight": 100 }] }
        }))
        .unwrap()
    }

    #[test]
    fn test_start_validates_config() {
        let config = Config {
            api_server: ApiServerConfig {
                port: -1,
                read_only: false,
            },
            ..Default::default()
        };
        let mut server = ApiServer::new(
            config,
            ResourceRegistry::new(),
            Arc::new(MemoryStore::new()),
        );

        assert!(matches!(server.start(), Err(Error::Config(_))));
        assert_eq!(server.state(), ServerState::NotStarted);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut server = server(false);
        assert_eq!(server.state(), ServerState::Running);
        assert!(matches!(server.start(), Err(Error::AlreadyRunning)));
    }

    #[test]
    fn test_new_seals_registry() {
        let server = server(false);
        assert!(server.registry().is_sealed());
    }

    #[test]
    fn test_index_lists_kinds_in_order() {
        let index = server(true).index();
        assert!(index.read_only);
        let paths: Vec<_> = index.resources.iter().map(|k| k.path.as_str()).collect();
        assert_eq!(paths, vec!["meshes", "traffic-routes", "traffic-permissions"]);
    }

    #[tokio::test]
    async fn test_traffic_routes_scenario() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(ResourceWsDefinition::of::<TrafficRouteDefinition>())
            .unwrap();
        assert!(registry.lookup("traffic-routes").is_ok());

        let writable = ApiServer::new(
            Config::default(),
            registry,
            Arc::new(MemoryStore::new()),
        );
        let listed = writable
            .handle(Verb::List, "traffic-routes", None, b"")
            .await
            .unwrap();
        match listed {
            ApiResponse::Collection(list) => {
                assert_eq!(list.total, 0);
                assert!(list.items.is_empty());
            }
            other => panic!("Expected collection, got {other:?}"),
        }

        let read_only = server(true);
        let err = read_only
            .handle(Verb::Create, "traffic-routes", None, &route_body("r1"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);

        let err = read_only
            .handle(Verb::List, "unknown-kind", None, b"")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.title(), "Unknown resource kind");
    }

    #[tokio::test]
    async fn test_read_only_ignores_body_and_existence() {
        let server = server(true);
        let err = server
            .handle(Verb::Update, "traffic-routes", Some("ghost"), b"not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(DispatchRejection::ReadOnly { .. })));

        let err = server
            .handle(Verb::Delete, "traffic-routes", Some("ghost"), b"")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(DispatchRejection::ReadOnly { .. })));
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let server = server(false);

        let created = server
            .handle(Verb::Create, "traffic-routes", None, &route_body("r1"))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let fetched = server
            .handle(Verb::Get, "traffic-routes", Some("r1"), b"")
            .await
            .unwrap();
        let ApiResponse::Item { resource, .. } = fetched else {
            panic!("Expected item");
        };
        assert_eq!(resource.kind, "TrafficRoute");
        assert_eq!(resource.version, 1);

        let updated = server
            .handle(Verb::Update, "traffic-routes", Some("r1"), &route_body("r1"))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);

        let deleted = server
            .handle(Verb::Delete, "traffic-routes", Some("r1"), b"")
            .await
            .unwrap();
        assert_eq!(deleted, ApiResponse::Deleted);

        let err = server
            .handle(Verb::Get, "traffic-routes", Some("r1"), b"")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_missing_creates() {
        let server = server(false);
        let response = server
            .handle(Verb::Update, "traffic-routes", Some("r2"), &route_body("r2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_rejects_unaddressable_names() {
        let server = server(false);

        for name in ["", "a/b", "two words"] {
            let body = serde_json::to_vec(&serde_json::json!({ "name": name, "spec": {} }))
                .unwrap();
            let err = server
                .handle(Verb::Create, "meshes", None, &body)
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "name {name:?}");
        }

        let listed = server.handle(Verb::List, "meshes", None, b"").await.unwrap();
        let ApiResponse::Collection(list) = listed else {
            panic!("Expected collection");
        };
        assert_eq!(list.total, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_never_conflict() {
        let server = server(false);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let server = server.clone();
                tokio::spawn(async move {
                    server
                        .handle(Verb::Update, "traffic-routes", Some("new"), &route_body("new"))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            let response = task.await.unwrap().unwrap();
            if response.status() == StatusCode::CREATED {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let server = server(false);
        server
            .handle(Verb::Create, "traffic-routes", None, &route_body("r1"))
            .await
            .unwrap();
        let err = server
            .handle(Verb::Create, "traffic-routes", None, &route_body("r1"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_body_validation() {
        let server = server(false);

        let wrong_type = br#"{"type": "Mesh", "name": "m1", "spec": {}}"#;
        let err = server
            .handle(Verb::Create, "traffic-routes", None, wrong_type)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = server
            .handle(Verb::Update, "traffic-routes", Some("r1"), &route_body("other"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let bad_spec = br#"{"name": "r1", "spec": {"destinations": "everywhere"}}"#;
        let err = server
            .handle(Verb::Create, "traffic-routes", None, bad_spec)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let nameless = br#"{"spec": {}}"#;
        let err = server
            .handle(Verb::Create, "meshes", None, nameless)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

//! HTTP transport implementation.
//!
//! Exposes every registered resource kind under uniform REST endpoints:
//!
//! - `GET    /{kind}`         list
//! - `POST   /{kind}`         create
//! - `GET    /{kind}/{name}`  get
//! - `PUT    /{kind}/{name}`  create or update
//! - `DELETE /{kind}/{name}`  delete
//!
//! Handlers carry no per-kind code; they map the request to a verb and hand
//! it to the [`ApiServer`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use super::{TransportError, TransportResult};
use crate::core::config::HttpConfig;
use crate::core::server::{ApiError, ApiResponse, ApiServer, ServerState};
use crate::domains::resources::Verb;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub title: String,
    pub details: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Run the HTTP transport until a shutdown signal is received.
    ///
    /// The server must already be started, so that its configuration has been
    /// validated before the listener is bound.
    pub async fn run(self, server: ApiServer) -> TransportResult<()> {
        if server.state() != ServerState::Running {
            return Err(TransportError::init(
                "server must be started before it can be served",
            ));
        }

        let port = server
            .config()
            .api_server
            .bind_port()
            .map_err(|e| TransportError::init(e.to_string()))?;
        let addr = format!("{}:{}", self.config.host, port);

        let read_only = server.config().api_server.read_only;
        let app = router(server, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;
        let local_addr = listener.local_addr()?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (read-only {}, CORS {})",
            local_addr, read_only, cors_status
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the router serving every kind registered with `server`.
pub fn router(server: ApiServer, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/{kind}", get(collection_handler).post(collection_handler))
        .route(
            "/{kind}/{name}",
            get(item_handler).put(item_handler).delete(item_handler),
        )
        .with_state(server)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Root handler - lists the served resource kinds.
async fn root_handler(State(server): State<ApiServer>) -> impl IntoResponse {
    Json(server.index())
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn collection_handler(
    State(server): State<ApiServer>,
    method: Method,
    Path(kind): Path<String>,
    body: Bytes,
) -> Response {
    serve(&server, method, &kind, None, &body).await
}

async fn item_handler(
    State(server): State<ApiServer>,
    method: Method,
    Path((kind, name)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    serve(&server, method, &kind, Some(name.as_str()), &body).await
}

#[instrument(skip(server, body))]
async fn serve(
    server: &ApiServer,
    method: Method,
    kind: &str,
    name: Option<&str>,
    body: &[u8],
) -> Response {
    let Some(verb) = Verb::from_method(&method, name.is_some()) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    match server.handle(verb, kind, name, body).await {
        Ok(ApiResponse::Item { status, resource }) => (status, Json(resource)).into_response(),
        Ok(ApiResponse::Collection(list)) => (StatusCode::OK, Json(list)).into_response(),
        Ok(ApiResponse::Deleted) => StatusCode::OK.into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &ApiError) -> Response {
    let status = error.status();
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }
    let body = ErrorBody {
        title: error.title().to_string(),
        details: error.to_string(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::core::config::{ApiServerConfig, Config};
    use crate::domains::resources::{MemoryStore, ResourceRegistry};

    fn app(read_only: bool) -> Router {
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
        router(server, false)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body
            .map(|b| Body::from(b.to_string()))
            .unwrap_or_else(Body::empty);
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn route(name: &str) -> Value {
        json!({
            "type": "TrafficRoute",
            "name": name,
            "spec": {
                "sources": ["web"],
                "destinations": [{ "service": "backend", "weight": 100 }]
            }
        })
    }

    #[tokio::test]
    async fn test_root_lists_kinds() {
        let app = app(false);
        let (status, body) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["readOnly"], false);
        assert_eq!(body["resources"][1]["path"], "traffic-routes");
        assert_eq!(body["resources"][1]["name"], "Traffic Route");
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app(false);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_crud_over_http() {
        let app = app(false);

        let (status, body) = send(&app, Method::GET, "/traffic-routes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, body) = send(&app, Method::POST, "/traffic-routes", Some(route("r1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["type"], "TrafficRoute");
        assert_eq!(body["version"], 1);

        let (status, body) = send(&app, Method::GET, "/traffic-routes/r1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spec"]["destinations"][0]["service"], "backend");

        let (status, body) = send(&app, Method::PUT, "/traffic-routes/r1", Some(route("r1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 2);

        let (status, body) = send(&app, Method::GET, "/traffic-routes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["name"], "r1");

        let (status, _) = send(&app, Method::DELETE, "/traffic-routes/r1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/traffic-routes/r1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["title"], "Resource not found");
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let app = app(true);

        let (status, _) = send(&app, Method::GET, "/traffic-routes", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/traffic-routes", Some(route("r1"))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["title"], "Server is read-only");

        let (status, _) = send(&app, Method::PUT, "/meshes/default", Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&app, Method::DELETE, "/meshes/missing", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found_even_when_read_only() {
        for read_only in [false, true] {
            let app = app(read_only);
            let (status, body) =
                send(&app, Method::POST, "/unknown-kind", Some(route("r1"))).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["title"], "Unknown resource kind");

            let (status, _) = send(&app, Method::GET, "/unknown-kind/x", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app(false);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/meshes")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let app = app(false);
        let (status, _) = send(&app, Method::PATCH, "/meshes/default", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_run_requires_started_server() {
        let server = ApiServer::new(
            Config::default(),
            ResourceRegistry::new(),
            Arc::new(MemoryStore::new()),
        );
        let result = HttpTransport::new(HttpConfig::default()).run(server).await;
        assert!(matches!(result, Err(TransportError::InitError(_))));
    }
}

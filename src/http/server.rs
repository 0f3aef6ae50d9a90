//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the outer Axum Router (admin endpoints + mock dispatch)
//! - Wire up middleware (tracing, request ID, CORS)
//! - Hold the compiled mock routes behind an atomic swap
//! - Reload config and routes on request or file change
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Mutex};
use tower::ServiceExt;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::loader::ConfigError;
use crate::config::schema::Verb;
use crate::config::watcher::ReloadRequest;
use crate::http::middleware::{cors_middleware, AllowedOrigins};
use crate::mocker::MockServer;
use crate::routing::compiler::RouteDescriptor;
use crate::routing::router::{route_pattern, RouteTable};

/// Path of the reload endpoint.
pub const RELOAD_PATH: &str = "/admin/reload";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub mocker: Arc<Mutex<MockServer>>,
    pub routes: Arc<ArcSwap<Router>>,
}

/// HTTP server for the mock routes.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server from a configured mock server.
    pub fn new(mocker: MockServer) -> Self {
        let (routes, count) = compile_routes(&mocker);
        tracing::info!(routes = count, "Routes compiled");

        let state = AppState {
            mocker: Arc::new(Mutex::new(mocker)),
            routes: Arc::new(ArcSwap::from_pointee(routes)),
        };

        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route(RELOAD_PATH, get(reload_handler).fallback(dispatch))
            .fallback(dispatch)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The complete router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Each message on `reloads` reloads the config file. The server stops
    /// once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut reloads: mpsc::UnboundedReceiver<ReloadRequest>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Mock server listening");

        let state = self.state.clone();
        let reload_task = tokio::spawn(async move {
            while reloads.recv().await.is_some() {
                if let Err(e) = reload(&state).await {
                    tracing::error!(
                        "Failed to reload config: {}. Keeping current routes.",
                        e
                    );
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Compile the mock server's routes with the CORS layer applied.
pub fn compile_routes(mocker: &MockServer) -> (Router, usize) {
    let table = mocker.route_table();
    let count = table.len();
    for route in shadowed_by_reload(&table) {
        tracing::warn!(
            verb = %route.verb,
            url = %route.service_url,
            "GET {} is the reload endpoint; the mock answers other methods only",
            RELOAD_PATH
        );
    }
    let origins = AllowedOrigins::new(mocker.options().allowed_domains.clone());

    let router = table
        .into_router(mocker.serve_context())
        .layer(middleware::from_fn_with_state(origins, cors_middleware));
    (router, count)
}

/// Routes whose GET (or HEAD) requests the reload endpoint answers.
pub fn shadowed_by_reload(table: &RouteTable) -> impl Iterator<Item = &RouteDescriptor> {
    table.routes().iter().filter(|route| {
        matches!(route.verb, Verb::Get | Verb::Head | Verb::All)
            && route_pattern(&route.service_url) == RELOAD_PATH
    })
}

/// Reload the config file and swap in freshly compiled routes.
///
/// The new options are committed together with their routes. On error the
/// current options and routes stay active.
pub async fn reload(state: &AppState) -> Result<usize, ConfigError> {
    let mut mocker = state.mocker.lock().await;
    let mut candidate = mocker.clone();
    candidate.load_config_file()?;

    let (routes, count) = compile_routes(&candidate);
    state.routes.store(Arc::new(routes));
    *mocker = candidate;

    tracing::info!(routes = count, "Routes reloaded");
    Ok(count)
}

async fn reload_handler(State(state): State<AppState>) -> Response {
    match reload(&state).await {
        Ok(routes) => Json(json!({ "status": "reloaded", "routes": routes })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Reload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Hand the request to the currently active mock routes.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let routes = state.routes.load_full();
    match Router::clone(&routes).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::OptionsOverrides;
    use crate::files::MemoryReader;
    use axum::body::Body;
    use axum::http::header;
    use serde_json::Value;

    const CONFIG_PATH: &str = "/srv/config.json";

    fn server(config: Value) -> HttpServer {
        let reader = MemoryReader::new()
            .with_file(CONFIG_PATH, config.to_string())
            .with_file("/srv/mocks/king.json", r#"{"name":"king"}"#)
            .with_file("/srv/mocks/ace.json", r#"{"name":"ace"}"#);
        let mut mocker = MockServer::new(OptionsOverrides {
            mock_directory: Some("/srv/mocks".into()),
            ..Default::default()
        })
        .with_reader(Arc::new(reader));
        mocker.set_config_file(CONFIG_PATH).load_config_file().unwrap();
        HttpServer::new(mocker)
    }

    async fn get(router: Router, uri: &str) -> Response {
        let req = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_serves_mock_with_headers() {
        let server = server(json!({
            "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
        }));

        let res = get(server.router(), "/first").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_reload_swaps_routes() {
        let server = server(json!({
            "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
        }));
        assert_eq!(get(server.router(), "/ace").await.status(), StatusCode::NOT_FOUND);

        // point the live instance at a different file with different services
        let reader = MemoryReader::new()
            .with_file(
                "/srv/other.json",
                json!({"webServices": {"ace": {"mockFile": "ace.json", "verbs": ["get"]}}})
                    .to_string(),
            )
            .with_file("/srv/mocks/ace.json", r#"{"name":"ace"}"#);
        {
            let mut mocker = server.state().mocker.lock().await;
            let swapped = mocker.clone().with_reader(Arc::new(reader));
            *mocker = swapped;
            mocker.set_config_file("/srv/other.json");
        }

        let res = get(server.router(), RELOAD_PATH).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["routes"], 1);

        assert_eq!(get(server.router(), "/ace").await.status(), StatusCode::OK);
        assert_eq!(get(server.router(), "/first").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reload_path_service_keeps_other_methods() {
        let server = server(json!({
            "webServices": {"admin/reload": {"mockFile": "king.json", "verbs": ["get", "post"]}}
        }));
        {
            let mocker = server.state().mocker.lock().await;
            let table = mocker.route_table();
            let shadowed: Vec<_> = shadowed_by_reload(&table).map(|r| r.verb).collect();
            assert_eq!(shadowed, vec![Verb::Get]);
        }

        let req = axum::http::Request::builder()
            .method("POST")
            .uri(RELOAD_PATH)
            .body(Body::empty())
            .unwrap();
        let res = server.router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"name":"king"}"#);

        let res = get(server.router(), RELOAD_PATH).await;
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "reloaded");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_routes() {
        let server = server(json!({
            "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
        }));
        {
            let mut mocker = server.state().mocker.lock().await;
            mocker.set_config_file("/srv/missing.json");
        }

        let res = get(server.router(), RELOAD_PATH).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(get(server.router(), "/first").await.status(), StatusCode::OK);
    }
}

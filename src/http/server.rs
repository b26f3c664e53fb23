//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum catch-all service in front of the macro router
//! - Wire up middleware (timeout, request ID, tracing)
//! - Turn dispatch outcomes into responses (200, 405 + Allow, 404 / else code)
//! - Apply config reloads by recompiling and swapping the router
//!
//! # Design Decisions
//! - Each request dispatches against one router snapshot
//! - A reload that fails to compile keeps the current router
//! - The matched route's name and parameters are echoed as JSON

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RouteConfig, RouterConfig};
use crate::http::request::{request_host, subdomain_of, X_REQUEST_ID};
use crate::lifecycle::{build_router, Shutdown};
use crate::observability::metrics;
use crate::routing::{Dispatch, Router as MacroRouter, RouterHandle};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RouterHandle<RouteConfig>>,
    pub root_domain: Option<Arc<str>>,
}

/// HTTP front for a compiled route set.
pub struct HttpServer {
    app: Router,
    handle: Arc<RouterHandle<RouteConfig>>,
}

#[derive(Serialize)]
struct MatchBody<'a> {
    route: &'a str,
    params: BTreeMap<&'a str, &'a str>,
    subdomain: Option<&'a str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    status: u16,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(config: &RouterConfig, router: MacroRouter<RouteConfig>) -> Self {
        metrics::record_route_count(router.len());
        let handle = Arc::new(RouterHandle::new(router));

        let state = AppState {
            router: handle.clone(),
            root_domain: config.server.root_domain.as_deref().map(Arc::from),
        };

        let app = Self::build_router(config, state);
        Self { app, handle }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.server.request_timeout_secs,
                    ))),
            )
    }

    /// The Axum service, for driving it without a socket.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// The published router; reloads swap what it points to.
    pub fn handle(&self) -> Arc<RouterHandle<RouteConfig>> {
        self.handle.clone()
    }

    /// Run the server until `shutdown` triggers.
    ///
    /// Each config received on `config_updates` is compiled and, if every
    /// route compiles, published.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: Option<mpsc::UnboundedReceiver<RouterConfig>>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(updates) = config_updates {
            tokio::spawn(apply_updates(self.handle.clone(), updates, shutdown.clone()));
        }

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Recompile and publish each received config until shutdown.
async fn apply_updates(
    handle: Arc<RouterHandle<RouteConfig>>,
    mut updates: mpsc::UnboundedReceiver<RouterConfig>,
    shutdown: Shutdown,
) {
    let stop = shutdown.signalled();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { break };
                match build_router(&config) {
                    Ok(router) => {
                        metrics::record_route_count(router.len());
                        handle.publish(router);
                        tracing::info!(routes = config.routes.len(), "Config reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reloaded config failed to compile, keeping current routes");
                    }
                }
            }
            _ = &mut stop => break,
        }
    }
}

async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let start = Instant::now();
    let host = request_host(&headers, &uri);
    let subdomain = subdomain_of(host, state.root_domain.as_deref());

    let router = state.router.load();
    let dispatch = router.dispatch(&method, subdomain, uri.path());
    metrics::record_dispatch(dispatch.outcome(), start);

    match dispatch {
        Dispatch::Matched(m) => {
            let body = MatchBody {
                route: m.route.name(),
                params: m.params.iter().collect(),
                subdomain: m.subdomain.as_deref(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Dispatch::MethodNotAllowed { allowed } => {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
            response
        }
        Dispatch::NotFound { status } => {
            let status = status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::NOT_FOUND);
            error_response(status, "no route matched")
        }
    }
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            status: status.as_u16(),
        }),
    )
        .into_response()
}

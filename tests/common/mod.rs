//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::Method;
use macro_router::config::{RouteConfig, RouterConfig};
use macro_router::http::HttpServer;
use macro_router::lifecycle::{build_router, Shutdown};
use macro_router::{Macros, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Router with default types and one `()` handler per `(method, path, name)`.
pub fn router(routes: &[(Method, &str, &str)]) -> Router<()> {
    let mut router = Router::new(Macros::defaults());
    for (method, path, name) in routes {
        router
            .compile(method.clone(), "", path, (), name)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
    }
    router
}

pub fn route(name: &str, method: &str, path: &str, subdomain: &str) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        method: method.to_string(),
        path: path.to_string(),
        subdomain: subdomain.to_string(),
    }
}

pub fn config(routes: Vec<RouteConfig>) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.server.root_domain = Some("example.com".to_string());
    config.routes = routes;
    config
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<RouterConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(config: RouterConfig) -> TestServer {
    let router = build_router(&config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(&config, router);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, Some(rx), server_shutdown).await;
    });

    // Listener is already bound; give the accept loop a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

//! HTTP front: status codes, headers, JSON bodies, subdomains and reload.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use macro_router::http::{HttpServer, X_REQUEST_ID};
use macro_router::lifecycle::build_router;
use serde_json::Value;
use tower::ServiceExt;

mod common;

use common::{config, route};

fn sample_config() -> macro_router::RouterConfig {
    config(vec![
        route("user", "GET", "/api/users/{userid:uint64 min(1)}", ""),
        route("user_delete", "DELETE", "/api/users/{userid:uint64 min(1)}", ""),
        route("pay", "GET", "/pay/{id:int else 402}", ""),
        route("files", "GET", "/files/{rest:path}", ""),
        route("admin_home", "GET", "/", "admin"),
        route("tenant", "GET", "/dashboard", "*."),
    ])
}

#[tokio::test]
async fn test_matched_route_returns_params() {
    let server = common::start_server(sample_config()).await;

    let res = common::client()
        .get(server.url("/api/users/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["route"], "user");
    assert_eq!(body["params"]["userid"], "7");
    assert!(body["subdomain"].is_null());

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_status_codes() {
    let server = common::start_server(sample_config()).await;
    let client = common::client();

    let res = client.post(server.url("/api/users/7")).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.headers()[header::ALLOW], "DELETE, GET");

    let res = client.get(server.url("/api/users/0")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let res = client.get(server.url("/pay/abc")).send().await.unwrap();
    assert_eq!(res.status(), 402);

    let res = client.get(server.url("/files/a/b/c")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["params"]["rest"], "a/b/c");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_subdomain_routing_from_host_header() {
    let server = common::start_server(sample_config()).await;
    let client = common::client();

    let res = client
        .get(server.url("/"))
        .header(header::HOST, "admin.example.com")
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["route"], "admin_home");
    assert_eq!(body["subdomain"], "admin");

    let res = client
        .get(server.url("/dashboard"))
        .header(header::HOST, "acme.example.com")
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["route"], "tenant");
    assert_eq!(body["subdomain"], "acme");

    let res = client
        .get(server.url("/dashboard"))
        .header(header::HOST, "example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_config_update_swaps_routes() {
    let server = common::start_server(sample_config()).await;
    let client = common::client();

    let res = client.get(server.url("/new/1")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    // A broken config is rejected and the current routes stay.
    let broken = config(vec![route("bad", "GET", "/{x:nope}", "")]);
    server.updates.send(broken).unwrap();

    let updated = config(vec![route("new", "GET", "/new/{id:int}", "")]);
    server.updates.send(updated).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(server.url("/new/1")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let res = client.get(server.url("/api/users/7")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_service_without_socket() {
    let config = sample_config();
    let router = build_router(&config).unwrap();
    let app = HttpServer::new(&config, router).app();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/users/12")
                .header(header::HOST, "example.com")
                .header(X_REQUEST_ID, "req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[X_REQUEST_ID], "req-1");
}

//! The reqwest transport against local backends.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::net::TcpListener;

use mirror_proxy::config::{TimeoutConfig, UpstreamConfig};
use mirror_proxy::upstream::{HttpUpstream, Upstream, UpstreamError};

mod common;

fn client() -> HttpUpstream {
    HttpUpstream::new(&TimeoutConfig::default(), &UpstreamConfig::default()).unwrap()
}

#[tokio::test]
async fn test_fetch_streams_backend_response() {
    let addr = common::start_mock_backend("text/plain", "hello from origin").await;

    let request = Request::builder()
        .uri(format!("http://{}/path?q=1", addr))
        .header("host", addr.to_string())
        .body(Body::empty())
        .unwrap();
    let response = client().fetch(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(common::body_string(response).await, "hello from origin");
}

#[tokio::test]
async fn test_fetch_with_body() {
    let addr = common::start_mock_backend("application/json", "{\"ok\":true}").await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("http://{}/submit", addr))
        .body(Body::from("payload"))
        .unwrap();
    let response = client().fetch(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "{\"ok\":true}");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = Request::builder()
        .uri(format!("http://{}/", addr))
        .body(Body::empty())
        .unwrap();
    let err = client().fetch(request).await.unwrap_err();

    assert!(matches!(err, UpstreamError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn test_redirect_to_other_host_gets_its_own_host_header() {
    let target = common::start_host_echo_backend().await;
    let origin = common::start_redirect_backend(format!("http://{target}/asset")).await;

    // The proxy pins Host to the real origin; the next hop must not inherit it.
    let request = Request::builder()
        .uri(format!("http://{origin}/archive.zip"))
        .header("host", "github.com")
        .body(Body::empty())
        .unwrap();
    let response = client().fetch(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_string(response).await,
        format!("seen host: {target}")
    );
}

#[tokio::test]
async fn test_slow_body_is_not_cut_off_by_request_deadline() {
    let addr = common::start_drip_backend("0123456789", 3, Duration::from_millis(800)).await;
    let timeouts = TimeoutConfig {
        request_secs: 1,
        idle_secs: 2,
        ..TimeoutConfig::default()
    };
    let client = HttpUpstream::new(&timeouts, &UpstreamConfig::default()).unwrap();

    let request = Request::builder()
        .uri(format!("http://{addr}/release.tar.gz"))
        .body(Body::empty())
        .unwrap();
    let response = client.fetch(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"012345678901234567890123456789");
}

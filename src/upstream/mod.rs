//! Outbound transport to the real origins.
//!
//! # Data Flow
//! ```text
//! rewritten Request<Body> (https://<real host>/...)
//!     → Upstream::fetch
//!     → client.rs (reqwest: TLS, redirects, transparent decompression)
//!     → Response<Body> (streamed)
//! ```
//!
//! # Design Decisions
//! - The transport sits behind a trait so the request path can be driven
//!   by an in-process fake in tests
//! - No retries: a failed fetch is reported to the client as a 502
//! - Bodies are streamed in both directions; buffering is the response
//!   rewriter's decision, not the transport's

pub mod client;

use axum::{
    body::Body,
    http::{Request, Response},
};
use futures_util::future::BoxFuture;
use thiserror::Error;

pub use client::HttpUpstream;

/// Errors produced while talking to an origin.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(String),

    /// Connection, TLS or protocol failure.
    #[error("{0}")]
    Network(String),

    /// The origin did not answer in time.
    #[error("upstream timed out: {0}")]
    Timeout(String),

    /// Reading the response body failed or exceeded the buffer limit.
    #[error("failed to read upstream body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_body() || err.is_decode() {
            UpstreamError::Body(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// Future returned by [`Upstream::fetch`].
pub type UpstreamFuture<'a> = BoxFuture<'a, Result<Response<Body>, UpstreamError>>;

/// Capability to perform one outbound HTTP exchange.
pub trait Upstream: Send + Sync {
    fn fetch(&self, request: Request<Body>) -> UpstreamFuture<'_>;
}

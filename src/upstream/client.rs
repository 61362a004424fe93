//! reqwest-backed [`Upstream`] implementation.

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{header, Request, Response},
};
use reqwest::redirect::Policy;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::upstream::{Upstream, UpstreamError, UpstreamFuture};

/// Production transport.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build a client honouring the configured timeouts and redirect policy.
    ///
    /// Only connection setup and the gap between reads are bounded here. The
    /// deadline for the response head is applied by the caller.
    pub fn new(timeouts: &TimeoutConfig, upstream: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let redirect = if upstream.follow_redirects {
            Policy::limited(upstream.max_redirects)
        } else {
            Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .read_timeout(Duration::from_secs(timeouts.idle_secs))
            .redirect(redirect)
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError> {
        let (mut parts, body) = request.into_parts();
        // The client derives Host from the URI on every hop, including
        // redirects to other origins.
        parts.headers.remove(header::HOST);

        let mut builder = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers);

        // An exactly-empty body is sent as no body at all.
        if body.size_hint().exact() != Some(0) {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = builder.send().await?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            *headers = upstream.headers().clone();
        }

        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| UpstreamError::Network(e.to_string()))
    }
}

impl Upstream for HttpUpstream {
    fn fetch(&self, request: Request<Body>) -> UpstreamFuture<'_> {
        Box::pin(self.send(request))
    }
}

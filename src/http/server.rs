//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind server to listener with graceful shutdown
//! - Run the boundary checks, resolve the origin, forward, rewrite
//!
//! # Design Decisions
//! - The request deadline covers only the wait for the origin's response
//!   head and surfaces as a 502; streamed bodies are bounded by the
//!   transport's idle timeout instead

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::MirrorConfig;
use crate::error::ProxyError;
use crate::http::boundary;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::mapping::{DomainTable, ResolvedTarget};
use crate::observability::metrics;
use crate::rewrite::{build_outbound, rewrite_response};
use crate::security::headers::apply_response_policy;
use crate::upstream::{HttpUpstream, Upstream, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<DomainTable>,
    pub upstream: Arc<dyn Upstream>,
    pub config: Arc<MirrorConfig>,
}

/// HTTP server for the mirror proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<MirrorConfig>,
}

impl HttpServer {
    /// Create a server that forwards through the production HTTP client.
    pub fn new(config: MirrorConfig, table: DomainTable) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstream::new(&config.timeouts, &config.upstream)?;
        Ok(Self::with_upstream(config, table, Arc::new(upstream)))
    }

    /// Create a server that forwards through the given transport.
    pub fn with_upstream(
        config: MirrorConfig,
        table: DomainTable,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            table: Arc::new(table),
            upstream,
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &MirrorConfig, state: AppState) -> Router {
        // Every path is proxied, including ones with empty segments.
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_request_body_bytes))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Applies boundary rules, resolves the origin and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    // 1. Boundary rules
    if let Some(redirect) = boundary::intercept(&request, &state.config.boundary) {
        metrics::record_request(&method, redirect.status().as_u16(), "none", start_time);
        return redirect;
    }

    // 2. Resolve origin
    let host = boundary::effective_host(&request);
    let target = match state.table.resolve(&host) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(request_id = %request_id, host = %host, error = %e, "Unconfigured domain");
            metrics::record_request(&method, e.status().as_u16(), "none", start_time);
            return e.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        prefix = %target.matched_prefix,
        origin = %target.real_host,
        "Proxying request"
    );

    // 3. Forward and rewrite
    match forward(&state, request, &target).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), &target.real_host, start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                origin = %target.real_host,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method, e.status().as_u16(), &target.real_host, start_time);
            e.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    target: &ResolvedTarget,
) -> Result<Response, ProxyError> {
    let is_head = request.method() == Method::HEAD;
    let outbound = build_outbound(request, target)?;
    tracing::trace!(uri = %outbound.uri(), "Outbound request");

    let deadline = Duration::from_secs(state.config.timeouts.request_secs);
    let response = tokio::time::timeout(deadline, state.upstream.fetch(outbound))
        .await
        .map_err(|_| {
            UpstreamError::Timeout(format!(
                "no response from {} within {}s",
                target.real_host,
                deadline.as_secs()
            ))
        })??;

    // HEAD responses carry no body to rewrite.
    let mut response = if is_head {
        response
    } else {
        let rules = target.rewrite_rules(&state.table);
        rewrite_response(response, &rules, state.config.rewrite.max_body_bytes).await?
    };

    apply_response_policy(response.headers_mut(), state.config.boundary.cache_max_age_secs);
    Ok(response)
}

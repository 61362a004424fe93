//! Boundary checks that run before any proxy logic.
//!
//! # Responsibilities
//! - Redirect a fixed set of paths to an external site
//! - Upgrade insecure requests to HTTPS
//! - Determine the effective hostname used for routing
//!
//! # Design Decisions
//! - Fixed-path redirects win over the HTTPS upgrade, regardless of host
//! - The inbound scheme comes from a trusted `X-Forwarded-Proto`, then the
//!   request URI, then a configured default (TLS terminates in front of us)
//! - Both redirects are 302

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    response::IntoResponse,
};

use crate::config::BoundaryConfig;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Short-circuit the request with a redirect, if a boundary rule applies.
pub fn intercept(request: &Request<Body>, config: &BoundaryConfig) -> Option<Response<Body>> {
    let path = request.uri().path();
    if config.redirect_paths.iter().any(|p| p == path) {
        tracing::debug!(path = %path, target = %config.redirect_target, "Fixed-path redirect");
        return Some(found(&config.redirect_target));
    }

    if inbound_scheme(request, config).eq_ignore_ascii_case("http") {
        let location = https_location(request);
        tracing::debug!(location = %location, "Upgrading insecure request");
        return Some(found(&location));
    }

    None
}

/// Scheme the client used to reach the proxy.
pub fn inbound_scheme<'a>(request: &'a Request<Body>, config: &'a BoundaryConfig) -> &'a str {
    if config.trust_forwarded_proto {
        let forwarded = request
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(scheme) = forwarded {
            return scheme;
        }
    }

    request
        .uri()
        .scheme_str()
        .unwrap_or(config.default_scheme.as_str())
}

/// Hostname used for routing: the `Host` header, else the URI authority.
/// Lowercased; keeps the port.
pub fn effective_host(request: &Request<Body>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .map(|h| h.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// The same URL over HTTPS.
fn https_location(request: &Request<Body>) -> String {
    let uri = request.uri();
    let authority = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| request.headers().get(header::HOST).and_then(|v| v.to_str().ok()))
        .unwrap_or_default();
    // The default HTTP port means "no port" once the scheme changes.
    let authority = authority.strip_suffix(":80").unwrap_or(authority);

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("https://{authority}{path_and_query}")
}

fn found(location: &str) -> Response<Body> {
    match Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .body(Body::empty())
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(location = %location, error = %e, "Invalid redirect location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

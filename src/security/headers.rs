//! Response header policy for proxied responses.
//!
//! # Responsibilities
//! - Open CORS so rewritten cross-origin references keep working
//! - Mark responses publicly cacheable
//! - Strip headers that would block rewritten content or wipe client storage
//! - Strip hop-by-hop headers from the upstream response
//!
//! # Design Decisions
//! - Applied only to responses that actually came from an origin; redirects
//!   and error responses produced locally are left alone

use axum::http::header::{self, HeaderMap, HeaderValue};

/// Headers removed from every proxied response.
const BLOCKING_RESPONSE_HEADERS: &[&str] = &[
    "content-security-policy",
    "content-security-policy-report-only",
    "clear-site-data",
];

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Amend upstream response headers before they reach the client.
pub fn apply_response_policy(headers: &mut HeaderMap, cache_max_age_secs: u64) {
    for name in HOP_BY_HOP_HEADERS.iter().chain(BLOCKING_RESPONSE_HEADERS) {
        headers.remove(*name);
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::CACHE_CONTROL, cache_control(cache_max_age_secs));
}

fn cache_control(max_age_secs: u64) -> HeaderValue {
    // Digits and ASCII punctuation only; always a valid header value.
    HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
        .unwrap_or_else(|_| HeaderValue::from_static("public"))
}

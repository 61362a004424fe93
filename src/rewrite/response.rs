//! Response body rewriting.
//!
//! # Responsibilities
//! - Decide whether a body is text that may carry origin URLs
//! - Replace absolute and protocol-relative references to every mirrored
//!   origin with the matching proxy hostname
//!
//! # Design Decisions
//! - Only the real hostnames are searched for, so a rule can never match
//!   text produced by another rule; rule order does not matter
//! - A match must be followed by `/`, a quote, whitespace or end of text,
//!   which keeps `github.com.evil.example` intact
//! - Root-relative paths (`"/assets/x.js"`) are never touched; clients
//!   resolve them against the proxied page origin
//! - Everything that is not text streams through without buffering

use std::borrow::Cow;

use axum::{
    body::Body,
    http::{header, Response},
};

use crate::mapping::RewriteRule;
use crate::observability::metrics;
use crate::upstream::UpstreamError;

/// Content-type fragments that mark a body as rewritable.
const TEXTUAL_TYPES: &[&str] = &[
    "text/",
    "application/json",
    "application/javascript",
    "application/xml",
];

/// True when a body with this content type should be rewritten.
pub fn is_rewritable(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    TEXTUAL_TYPES.iter().any(|t| content_type.contains(t))
}

/// Apply every rule to `text`.
pub fn rewrite_body(text: &str, rules: &[RewriteRule]) -> String {
    let mut current = text.to_owned();
    for rule in rules {
        let next = match rewrite_host(&current, &rule.match_host, &rule.replacement_host) {
            Cow::Owned(next) => Some(next),
            Cow::Borrowed(_) => None,
        };
        if let Some(next) = next {
            current = next;
        }
    }
    current
}

/// Rewrite `http://host`, `https://host` and `//host` to the proxy host.
///
/// Absolute forms always come out as `https://`.
fn rewrite_host<'a>(text: &'a str, host: &str, replacement: &str) -> Cow<'a, str> {
    let needle = format!("//{host}");
    let mut out = String::new();
    let mut copied = 0;

    for (at, _) in text.match_indices(needle.as_str()) {
        let end = at + needle.len();
        if !is_host_boundary(&text[end..]) {
            continue;
        }

        let pending = &text[copied..at];
        let (keep, scheme) = if let Some(head) = pending.strip_suffix("https:") {
            (head, "https:")
        } else if let Some(head) = pending.strip_suffix("http:") {
            (head, "https:")
        } else {
            (pending, "")
        };

        out.push_str(keep);
        out.push_str(scheme);
        out.push_str("//");
        out.push_str(replacement);
        copied = end;
    }

    if copied == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

fn is_host_boundary(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => matches!(c, '/' | '"' | '\'') || c.is_whitespace(),
    }
}

/// Rewrite a textual upstream response; pass anything else through.
///
/// Textual bodies are buffered up to `max_body_bytes`, decoded as UTF-8
/// (lossily), rewritten and re-encoded. The stale `Content-Length` is
/// dropped so the server recomputes it.
pub async fn rewrite_response(
    response: Response<Body>,
    rules: &[RewriteRule],
    max_body_bytes: usize,
) -> Result<Response<Body>, UpstreamError> {
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !is_rewritable(content_type) {
        metrics::record_body_passthrough();
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| UpstreamError::Body(e.to_string()))?;

    let text = String::from_utf8_lossy(&bytes);
    let rewritten = rewrite_body(&text, rules);

    tracing::trace!(
        original_len = bytes.len(),
        rewritten_len = rewritten.len(),
        "Rewrote response body"
    );
    metrics::record_body_rewrite(bytes.len());

    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(rewritten)))
}

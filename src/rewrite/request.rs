//! Outbound request construction.
//!
//! # Responsibilities
//! - Repair nested-URL corruption on commit-info endpoints
//! - Point the request at the real origin over HTTPS
//! - Replace `Host` and `Referer` with origin-side values
//! - Drop the body for bodyless methods
//!
//! # Design Decisions
//! - Path repair is a targeted match, not general sanitization; every path
//!   that does not have the exact shape passes through byte-identical
//! - `Accept-Encoding` is left to the transport so response bodies arrive
//!   decoded and can be rewritten as text

use std::borrow::Cow;

use axum::{
    body::Body,
    http::{
        header::{self, HeaderMap, HeaderValue},
        uri::Scheme,
        Method, Request, Uri,
    },
};

use crate::mapping::ResolvedTarget;

/// Endpoints whose `<ref>` segment sometimes gets an absolute URL appended.
const COMMIT_INFO_ENDPOINTS: &[&str] = &["latest-commit", "tree-commit-info"];

/// Injected URL openings, repaired in this order.
const INJECTED_SCHEMES: &[&str] = &["/https%3A//", "/https://"];

/// Hop-by-hop headers (RFC 9110 §7.6.1) plus headers the transport owns.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "accept-encoding",
];

/// Truncate `/<owner>/<repo>/<endpoint>/<ref>/https%3A//<host>/...` (and the
/// literal `https://` form) after `<ref>`.
///
/// ```
/// use mirror_proxy::rewrite::denest_path;
///
/// assert_eq!(
///     denest_path("/user/repo/latest-commit/main/https%3A//gh.example.org/evil"),
///     "/user/repo/latest-commit/main",
/// );
/// assert_eq!(denest_path("/user/repo/blob/main/README.md"), "/user/repo/blob/main/README.md");
/// ```
pub fn denest_path(path: &str) -> Cow<'_, str> {
    let mut repaired = Cow::Borrowed(path);
    for scheme in INJECTED_SCHEMES {
        if let Some(cut) = find_nested_url(&repaired, scheme) {
            repaired = Cow::Owned(repaired[..cut].to_string());
        }
    }
    repaired
}

/// Offset at which the leftmost nested URL starts.
fn find_nested_url(path: &str, scheme: &str) -> Option<usize> {
    path.match_indices('/')
        .find_map(|(start, _)| match_commit_info(&path[start..], scheme).map(|len| start + len))
}

/// Length of the `/<owner>/<repo>/<endpoint>/<ref>` head of `s`, provided it
/// is followed by `scheme`, a non-empty host and a `/`.
fn match_commit_info(s: &str, scheme: &str) -> Option<usize> {
    let mut pos = 0;
    for index in 0..4 {
        let start = pos + 1;
        let len = s.get(start..)?.find('/')?;
        if len == 0 {
            return None;
        }
        if index == 2 && !COMMIT_INFO_ENDPOINTS.contains(&&s[start..start + len]) {
            return None;
        }
        pos = start + len;
    }

    let injected = s[pos..].strip_prefix(scheme)?;
    let host_len = injected.find('/')?;
    (host_len > 0).then_some(pos)
}

/// Methods forwarded without a body.
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Build the request sent to the real origin.
pub fn build_outbound(
    request: Request<Body>,
    target: &ResolvedTarget,
) -> Result<Request<Body>, axum::http::Error> {
    let (parts, body) = request.into_parts();

    let path = denest_path(parts.uri.path());
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.into_owned(),
    };

    let uri = Uri::builder()
        .scheme(Scheme::HTTPS)
        .authority(target.real_host.as_str())
        .path_and_query(path_and_query)
        .build()?;

    let mut headers = parts.headers;
    strip_request_headers(&mut headers);
    headers.insert(header::HOST, HeaderValue::from_str(&target.real_host)?);
    headers.insert(header::REFERER, HeaderValue::from_str(&uri.to_string())?);

    let body = if is_bodyless(&parts.method) {
        headers.remove(header::CONTENT_LENGTH);
        Body::empty()
    } else {
        body
    };

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(uri)
        .body(body)?;
    *outbound.headers_mut() = headers;
    Ok(outbound)
}

fn strip_request_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_REQUEST_HEADERS {
        headers.remove(*name);
    }
}

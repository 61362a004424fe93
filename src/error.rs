//! Request-path errors and their client-facing responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Errors that end a proxied request early.
///
/// Messages are returned verbatim to the client.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The effective hostname carries no recognizable proxy prefix.
    #[error("Domain not configured for proxy. Host: {host}, Prefix check failed")]
    UnknownPrefix { host: String },

    /// A prefix was found but no origin is mapped to it.
    #[error("Domain not configured for proxy. Host: {host}, Prefix: {prefix}, Target lookup failed")]
    UnknownOrigin { host: String, prefix: String },

    /// The outbound request could not be assembled.
    #[error("Proxy Error: {0}")]
    Outbound(#[from] axum::http::Error),

    /// The outbound call or the upstream body read failed.
    #[error("Proxy Error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UnknownPrefix { .. } | ProxyError::UnknownOrigin { .. } => {
                StatusCode::NOT_FOUND
            }
            ProxyError::Outbound(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! The domain table is deliberately absent: it is compiled in.

use serde::{Deserialize, Serialize};

/// Root configuration for the mirror proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MirrorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound transport behaviour.
    pub upstream: UpstreamConfig,

    /// Redirects, scheme detection and response header policy.
    pub boundary: BoundaryConfig,

    /// Response body rewriting limits.
    pub rewrite: RewriteConfig,

    /// Inbound request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the origin to start answering (status and headers) in seconds.
    pub request_secs: u64,

    /// Longest pause between two reads of an upstream body in seconds.
    /// Bodies have no total deadline so large downloads are not cut off.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 30,
        }
    }
}

/// Outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Follow upstream redirects instead of relaying them.
    pub follow_redirects: bool,

    /// Maximum redirect hops when following.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

/// Boundary handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Exact paths redirected away before any proxying.
    pub redirect_paths: Vec<String>,

    /// Where `redirect_paths` are sent (302).
    pub redirect_target: String,

    /// Use `X-Forwarded-Proto` to detect the inbound scheme.
    pub trust_forwarded_proto: bool,

    /// Scheme assumed when the request carries no scheme information.
    pub default_scheme: String,

    /// `max-age` of the public cache directive added to proxied responses.
    pub cache_max_age_secs: u64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            redirect_paths: ["/", "/login", "/signup", "/copilot"]
                .into_iter()
                .map(String::from)
                .collect(),
            redirect_target: "https://www.gov.cn".to_string(),
            trust_forwarded_proto: true,
            default_scheme: "https".to_string(),
            cache_max_age_secs: 14_400,
        }
    }
}

/// Response rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Largest textual body buffered for rewriting, in bytes.
    pub max_body_bytes: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound request body size in bytes.
    pub max_request_body_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

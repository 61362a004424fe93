//! Mirror proxy library.
//!
//! Serves a fixed set of upstream origins through subdomains of a proxy
//! base domain and rewrites textual responses so every embedded link to a
//! mirrored origin points back through the proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::boundary ──▶ mapping ──▶ rewrite::request ──▶ upstream ──▶ Origin
//!              (redirects,        (prefix →    (https, de-nested     (reqwest)
//!               https upgrade)     origin)      path, Host/Referer)
//!
//!   Client ◀── security::headers ◀── rewrite::response ◀─────────── upstream ◀── Origin
//!              (CORS, cache,         (origin URLs → proxy URLs,
//!               strip CSP)            text bodies only)
//! ```
//!
//! The domain table is built once at startup and shared read-only; every
//! request is otherwise stateless.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod mapping;
pub mod observability;
pub mod rewrite;
pub mod security;
pub mod upstream;

pub use config::MirrorConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use mapping::DomainTable;

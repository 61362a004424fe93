//! Security-related header handling.
//!
//! # Data Flow
//! ```text
//! Upstream response:
//!     → headers.rs (CORS, cache directive, strip CSP / Clear-Site-Data)
//!     → Client
//! ```
//!
//! Inbound request size limits are enforced by the server's body limit layer.

pub mod headers;

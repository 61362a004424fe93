//! Request and response rewriting.
//!
//! # Data Flow
//! ```text
//! inbound Request + ResolvedTarget
//!     → request.rs (de-nest path, https://<real host>, Host/Referer)
//!     → [upstream fetch]
//!     → response.rs (textual? rewrite every mirrored origin : passthrough)
//! ```

pub mod request;
pub mod response;

pub use request::{build_outbound, denest_path, is_bodyless};
pub use response::{is_rewritable, rewrite_body, rewrite_response};

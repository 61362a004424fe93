//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → boundary.rs (fixed-path redirect, HTTPS upgrade, effective host)
//!     → [mapping resolves the origin]
//!     → [rewrite builds the outbound request, upstream fetches it]
//!     → [rewrite transforms the body, security/headers amends headers]
//!     → Send to client
//! ```

pub mod boundary;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

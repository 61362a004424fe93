//! Domain mapping subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     builtin entries (real host → canonical prefix)
//!     → table.rs (validate, reject duplicate prefixes)
//!     → DomainTable (immutable, shared via Arc)
//!
//! Per request:
//!     effective hostname
//!     → resolver.rs extract_prefix ("gh." or "<label>-gh.")
//!     → resolver.rs resolve_origin (prefix → real host)
//!     → ResolvedTarget { matched_prefix, real_host, host_suffix }
//!     → RewriteRule per table entry (used by the response rewriter)
//! ```
//!
//! # Design Decisions
//! - The table is compiled in, validated once, never mutated
//! - Reverse lookups go through a map keyed by the hyphenated host, so
//!   resolution never depends on table iteration order
//! - No regex: prefixes are located by scanning the first DNS label

pub mod resolver;
pub mod table;

pub use resolver::{extract_prefix, ResolvedTarget, RewriteRule};
pub use table::{DomainTable, MappingError, OriginEntry, PRIMARY_DELIMITER};

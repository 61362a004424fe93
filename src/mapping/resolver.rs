//! Prefix resolution: inbound proxy hostname → real origin.
//!
//! # Responsibilities
//! - Locate the proxy prefix at the start of the effective hostname
//! - Map that prefix back to the real origin
//! - Derive the host suffix used to rebuild sibling proxy hostnames
//!
//! # Design Decisions
//! - Hostnames are compared lowercased; the port, if any, stays in the suffix
//! - Derived prefixes never contain a dot before `-gh.`, so the prefix is
//!   always the complete first DNS label plus its dot
//! - The bare delimiter always resolves to the primary origin

use serde::Serialize;

use crate::error::ProxyError;
use crate::mapping::table::{hyphenate, DomainTable, DERIVED_DELIMITER, PRIMARY_DELIMITER};

/// Per-request routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    /// Prefix located at the start of the effective hostname.
    pub matched_prefix: String,
    /// Real origin the request is forwarded to.
    pub real_host: String,
    /// Remainder of the effective hostname after `matched_prefix`.
    pub host_suffix: String,
}

/// Replacement of one real host by its proxy hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRule {
    pub match_host: String,
    pub replacement_host: String,
}

impl ResolvedTarget {
    /// The hostname the request arrived on.
    pub fn effective_host(&self) -> String {
        format!("{}{}", self.matched_prefix, self.host_suffix)
    }

    /// One rule per table entry, all built from this request's suffix.
    pub fn rewrite_rules(&self, table: &DomainTable) -> Vec<RewriteRule> {
        table
            .entries()
            .iter()
            .map(|entry| RewriteRule {
                match_host: entry.real_host.clone(),
                replacement_host: format!("{}{}", entry.canonical_prefix, self.host_suffix),
            })
            .collect()
    }
}

/// Extract the proxy prefix from a hostname.
///
/// Returns `gh.` for hosts starting with it, `<label>-gh.` when the first
/// DNS label is made of `[a-z0-9-]` and ends in `-gh`, and `None` otherwise.
pub fn extract_prefix(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    if host.starts_with(PRIMARY_DELIMITER) {
        return Some(PRIMARY_DELIMITER.to_string());
    }

    let dot = host.find('.')?;
    let label = &host[..dot];
    let stem = label.strip_suffix(DERIVED_DELIMITER.trim_end_matches('.'))?;
    let valid = !stem.is_empty()
        && label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Some(host[..=dot].to_string())
    } else {
        None
    }
}

impl DomainTable {
    /// Map a proxy prefix back to its real origin.
    pub fn resolve_origin(&self, prefix: &str) -> Option<&str> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix == PRIMARY_DELIMITER {
            return Some(self.primary().real_host.as_str());
        }
        let stem = prefix.strip_suffix(DERIVED_DELIMITER)?;
        self.lookup_label(&hyphenate(stem))
            .map(|entry| entry.real_host.as_str())
    }

    /// Resolve an effective hostname into a routing decision.
    pub fn resolve(&self, effective_host: &str) -> Result<ResolvedTarget, ProxyError> {
        let host = effective_host.trim().to_ascii_lowercase();

        let Some(prefix) = extract_prefix(&host) else {
            return Err(ProxyError::UnknownPrefix { host });
        };

        let Some(real_host) = self.resolve_origin(&prefix) else {
            return Err(ProxyError::UnknownOrigin { host, prefix });
        };

        Ok(ResolvedTarget {
            real_host: real_host.to_string(),
            host_suffix: host[prefix.len()..].to_string(),
            matched_prefix: prefix,
        })
    }
}

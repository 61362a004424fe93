//! The domain table: real upstream hosts and their proxy prefixes.
//!
//! # Responsibilities
//! - Hold the fixed set of mirrored origins
//! - Derive each origin's canonical prefix
//! - Reject tables whose prefixes could be confused with one another
//!
//! # Invariants
//! - Every prefix ends in the only dot it contains, so no prefix is a leading
//!   part of another; distinct hyphenations are the only check needed
//!
//! # Design Decisions
//! - The primary origin gets the bare delimiter (`gh.`); every other origin
//!   gets its hostname with dots replaced by hyphens plus `-gh.`
//! - Validation runs once when the table is built; a bad table is fatal

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

/// Prefix of the primary origin. Also the tail of every derived prefix.
pub const PRIMARY_DELIMITER: &str = "gh.";

/// Tail appended to the hyphenated hostname of every non-primary origin.
pub const DERIVED_DELIMITER: &str = "-gh.";

const PRIMARY_HOST: &str = "github.com";

const SATELLITE_HOSTS: &[&str] = &[
    "avatars.githubusercontent.com",
    "github.githubassets.com",
    "collector.github.com",
    "api.github.com",
    "raw.githubusercontent.com",
    "gist.githubusercontent.com",
    "github.io",
    "assets-cdn.github.com",
    "cdn.jsdelivr.net",
    "securitylab.github.com",
    "www.githubstatus.com",
    "npmjs.com",
    "git-lfs.github.com",
    "githubusercontent.com",
    "github.global.ssl.fastly.net",
    "api.npms.io",
    "github.community",
];

/// Errors raised while building a [`DomainTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// Hostname is empty or not a plain DNS name.
    #[error("invalid origin hostname {0:?}")]
    InvalidHost(String),

    /// The same hostname appears twice.
    #[error("origin {0} is listed more than once")]
    DuplicateHost(String),

    /// Two hostnames collapse to the same prefix.
    #[error("origins {first} and {second} both map to prefix {prefix}")]
    DuplicatePrefix {
        first: String,
        second: String,
        prefix: String,
    },
}

/// A single mirrored origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginEntry {
    /// Hostname of the real upstream.
    pub real_host: String,
    /// Leading hostname fragment that routes to `real_host`.
    pub canonical_prefix: String,
}

/// Immutable, validated mapping between real hosts and proxy prefixes.
///
/// The primary origin is always the first entry.
#[derive(Debug, Clone)]
pub struct DomainTable {
    entries: Vec<OriginEntry>,
    /// Hyphenated hostname → index into `entries`.
    by_label: HashMap<String, usize>,
}

impl DomainTable {
    /// Build and validate a table from a primary host and its satellites.
    pub fn new<I, S>(primary: &str, satellites: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let primary = normalize_host(primary)?;
        let mut entries = vec![OriginEntry {
            real_host: primary,
            canonical_prefix: PRIMARY_DELIMITER.to_string(),
        }];

        for host in satellites {
            let host = normalize_host(host.as_ref())?;
            if entries.iter().any(|e| e.real_host == host) {
                return Err(MappingError::DuplicateHost(host));
            }
            entries.push(OriginEntry {
                canonical_prefix: derived_prefix(&host),
                real_host: host,
            });
        }

        let mut by_label = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let label = hyphenate(&entry.real_host);
            if let Some(&prev) = by_label.get(&label) {
                let first: &OriginEntry = &entries[prev];
                return Err(MappingError::DuplicatePrefix {
                    first: first.real_host.clone(),
                    second: entry.real_host.clone(),
                    prefix: format!("{label}{DERIVED_DELIMITER}"),
                });
            }
            by_label.insert(label, idx);
        }

        Ok(Self { entries, by_label })
    }

    /// The table shipped with the proxy.
    pub fn builtin() -> Result<Self, MappingError> {
        Self::new(PRIMARY_HOST, SATELLITE_HOSTS.iter().copied())
    }

    /// All entries, primary first.
    pub fn entries(&self) -> &[OriginEntry] {
        &self.entries
    }

    /// The primary origin.
    pub fn primary(&self) -> &OriginEntry {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical prefix for a real host, if it is mirrored.
    pub fn prefix_for(&self, real_host: &str) -> Option<&str> {
        let host = real_host.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|e| e.real_host == host)
            .map(|e| e.canonical_prefix.as_str())
    }

    /// Entry whose hyphenated hostname equals `label`.
    pub(crate) fn lookup_label(&self, label: &str) -> Option<&OriginEntry> {
        self.by_label.get(label).map(|&idx| &self.entries[idx])
    }
}

/// `api.github.com` → `api-github-com`.
pub(crate) fn hyphenate(host: &str) -> String {
    host.trim().to_ascii_lowercase().replace('.', "-")
}

fn derived_prefix(host: &str) -> String {
    format!("{}{}", hyphenate(host), DERIVED_DELIMITER)
}

fn normalize_host(raw: &str) -> Result<String, MappingError> {
    let host = raw.trim().to_ascii_lowercase();
    let valid = !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
        && host.split('.').all(|label| !label.is_empty());
    if valid {
        Ok(host)
    } else {
        Err(MappingError::InvalidHost(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = DomainTable::builtin().unwrap();
        assert_eq!(table.len(), 18);
        assert_eq!(table.primary().real_host, "github.com");
        assert_eq!(table.primary().canonical_prefix, "gh.");
        assert_eq!(
            table.prefix_for("avatars.githubusercontent.com"),
            Some("avatars-githubusercontent-com-gh.")
        );
        assert_eq!(table.prefix_for("cdn.jsdelivr.net"), Some("cdn-jsdelivr-net-gh."));
        assert_eq!(table.prefix_for("example.com"), None);
    }

    #[test]
    fn test_builtin_prefixes_are_unique_and_non_overlapping() {
        let table = DomainTable::builtin().unwrap();
        for a in table.entries() {
            for b in table.entries() {
                if a.real_host != b.real_host {
                    assert!(!b.canonical_prefix.starts_with(&a.canonical_prefix));
                }
            }
        }
    }

    #[test]
    fn test_no_prefix_leads_another_in_any_table() {
        // Hosts chosen so their labels share leading text with each other and
        // with the primary delimiter.
        let table = DomainTable::new(
            "github.com",
            ["gh", "gh.io", "gh-gh", "g.h", "gh-gh.io", "github"],
        )
        .unwrap();
        for a in table.entries() {
            for b in table.entries() {
                if a.real_host != b.real_host {
                    assert!(
                        !b.canonical_prefix.starts_with(&a.canonical_prefix),
                        "{} leads {}",
                        a.canonical_prefix,
                        b.canonical_prefix
                    );
                }
            }
        }
        assert_eq!(table.prefix_for("gh"), Some("gh-gh."));
        assert_eq!(table.prefix_for("gh-gh"), Some("gh-gh-gh."));
    }

    #[test]
    fn test_duplicate_host_rejected() {
        let err = DomainTable::new("github.com", ["api.github.com", "API.github.com"]).unwrap_err();
        assert_eq!(err, MappingError::DuplicateHost("api.github.com".into()));
    }

    #[test]
    fn test_colliding_hyphenation_rejected() {
        // Both hyphenate to "git-lfs-github-com".
        let err = DomainTable::new("github.com", ["git-lfs.github.com", "git.lfs-github.com"])
            .unwrap_err();
        assert!(matches!(err, MappingError::DuplicatePrefix { .. }));

        let err = DomainTable::new("github.com", ["github-com"]).unwrap_err();
        assert!(matches!(err, MappingError::DuplicatePrefix { .. }));
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(matches!(
            DomainTable::new("", Vec::<&str>::new()),
            Err(MappingError::InvalidHost(_))
        ));
        assert!(matches!(
            DomainTable::new("github.com", ["bad..host"]),
            Err(MappingError::InvalidHost(_))
        ));
        assert!(matches!(
            DomainTable::new("github.com", ["under_score.com"]),
            Err(MappingError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_lookup_label() {
        let table = DomainTable::builtin().unwrap();
        assert_eq!(
            table.lookup_label("api-github-com").map(|e| e.real_host.as_str()),
            Some("api.github.com")
        );
        assert_eq!(
            table.lookup_label("github-com").map(|e| e.real_host.as_str()),
            Some("github.com")
        );
        assert!(table.lookup_label("nope").is_none());
    }
}

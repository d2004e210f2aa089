//! Schema release numbers.
//!
//! Behavior of the resolver changes across major releases (directionality
//! arrived in 2.x, qualifiers in 3.x), so every version label has to map onto
//! a release. Floating labels such as `latest` carry no number of their own;
//! they take the `version:` field declared by the schema document.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaRelease {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaRelease {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `v3.1.2`, `3.1.2`, `3.1` or `3`. Returns `None` for anything else
    /// (including floating labels like `latest` or `master`).
    pub fn parse(label: &str) -> Option<Self> {
        let s = label.trim();
        let s = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        if s.is_empty() {
            return None;
        }

        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }

    /// Release for a version label, preferring the document's own declaration.
    pub fn resolve(label: &str, declared: Option<&str>) -> Option<Self> {
        declared
            .and_then(Self::parse)
            .or_else(|| Self::parse(label))
    }
}

impl fmt::Display for SchemaRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_with_and_without_prefix() {
        assert_eq!(SchemaRelease::parse("v3.1.2"), Some(SchemaRelease::new(3, 1, 2)));
        assert_eq!(SchemaRelease::parse("1.8"), Some(SchemaRelease::new(1, 8, 0)));
        assert_eq!(SchemaRelease::parse("latest"), None);
        assert_eq!(SchemaRelease::parse("3.1.2.4"), None);
        assert_eq!(SchemaRelease::parse("v"), None);
    }

    #[test]
    fn floating_labels_use_declared_release() {
        let r = SchemaRelease::resolve("latest", Some("4.2.0"));
        assert_eq!(r.map(|r| r.major), Some(4));
        assert_eq!(SchemaRelease::resolve("v2.4.7", None).map(|r| r.major), Some(2));
        assert_eq!(SchemaRelease::resolve("latest", None), None);
    }
}

//! Schema version ordering
//!
//! Schema versions are free-form strings such as `"1.0.0"`, `"1.2"` or
//! `"v2"`. They are normalised to three numeric components before being
//! parsed with [`semver`], so `"1.0"` and `"1.0.0"` name the same version.

use crate::error::SchemaError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// An ordered schema version
///
/// Equality and ordering use the parsed version; [`Display`](fmt::Display)
/// returns the string as it was declared.
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    raw: String,
    parsed: semver::Version,
}

impl SchemaVersion {
    /// Parse a version string
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidVersion`] if the string is not a
    /// dotted numeric version (with optional pre-release/build suffix).
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SchemaError::invalid_version(raw, "empty version"));
        }
        let normalized = normalize(trimmed.strip_prefix('v').unwrap_or(trimmed));
        let parsed = semver::Version::parse(&normalized)
            .map_err(|e| SchemaError::invalid_version(raw, e.to_string()))?;
        Ok(Self {
            raw: trimmed.to_string(),
            parsed,
        })
    }

    /// Declared version string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed semantic version
    #[inline]
    #[must_use]
    pub fn semver(&self) -> &semver::Version {
        &self.parsed
    }

    /// Compare two version strings without keeping the parsed values
    ///
    /// # Errors
    /// Returns an error if either string is not a valid version.
    pub fn compare(a: &str, b: &str) -> Result<Ordering, SchemaError> {
        Ok(Self::parse(a)?.cmp(&Self::parse(b)?))
    }
}

/// Pad the numeric core to `major.minor.patch`
fn normalize(version: &str) -> String {
    let split_at = version.find(|c| c == '-' || c == '+').unwrap_or(version.len());
    let (core, suffix) = version.split_at(split_at);
    let mut core = core.to_string();
    for _ in core.split('.').count()..3 {
        core.push_str(".0");
    }
    core.push_str(suffix);
    core
}

impl PartialEq for SchemaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for SchemaVersion {}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl Hash for SchemaVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parsed.hash(state);
    }
}

impl FromStr for SchemaVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_versions_are_padded() {
        assert_eq!(SchemaVersion::parse("1").unwrap(), SchemaVersion::parse("1.0.0").unwrap());
        assert_eq!(SchemaVersion::parse("1.2").unwrap(), SchemaVersion::parse("1.2.0").unwrap());
        assert_eq!(SchemaVersion::parse("v2.1").unwrap().semver().minor, 1);
    }

    #[test]
    fn display_keeps_declared_form() {
        let version = SchemaVersion::parse("1.2").unwrap();
        assert_eq!(version.to_string(), "1.2");
        assert_eq!(version.as_str(), "1.2");
    }

    #[test]
    fn numeric_ordering_not_lexical() {
        assert_eq!(SchemaVersion::compare("1.10.0", "1.9.0").unwrap(), Ordering::Greater);
        assert_eq!(SchemaVersion::compare("2.0.0", "10.0.0").unwrap(), Ordering::Less);
    }

    #[test]
    fn prerelease_sorts_before_release() {
        assert_eq!(
            SchemaVersion::compare("1.0.0-beta", "1.0.0").unwrap(),
            Ordering::Less
        );
        assert_eq!(SchemaVersion::compare("1.0-rc.1", "1.0.0").unwrap(), Ordering::Less);
    }

    #[test]
    fn rejects_garbage() {
        assert!(SchemaVersion::parse("").is_err());
        assert!(SchemaVersion::parse("one.two").is_err());
        assert!(matches!(
            SchemaVersion::parse("1.x").unwrap_err(),
            SchemaError::InvalidVersion { .. }
        ));
    }

    proptest! {
        #[test]
        fn prop_ordering_matches_numeric_tuples(
            a in (0u64..50, 0u64..50, 0u64..50),
            b in (0u64..50, 0u64..50, 0u64..50),
        ) {
            let va = SchemaVersion::parse(&format!("{}.{}.{}", a.0, a.1, a.2)).unwrap();
            let vb = SchemaVersion::parse(&format!("{}.{}.{}", b.0, b.1, b.2)).unwrap();
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }

        #[test]
        fn prop_trailing_zero_components_are_equal(major in 0u64..100, minor in 0u64..100) {
            let short = SchemaVersion::parse(&format!("{major}.{minor}")).unwrap();
            let long = SchemaVersion::parse(&format!("{major}.{minor}.0")).unwrap();
            prop_assert_eq!(short, long);
        }
    }
}

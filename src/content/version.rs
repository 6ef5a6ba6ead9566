//! Lenient version parsing for content fields.
//!
//! Content documents write versions loosely (`5.5`, `6`, `6.10.0`); every
//! comparison in the crate goes through [`parse_version`] so they are
//! normalized to full `major.minor.patch` first.

use semver::Version;

/// Default `fromversion` when an item does not declare one.
pub const DEFAULT_FROM_VERSION: &str = "0.0.0";

/// Default `toversion` when an item does not declare one.
pub const DEFAULT_TO_VERSION: &str = "99.99.99";

/// Oldest platform version content may target.
pub const OLDEST_SUPPORTED_VERSION: &str = "5.0.0";

/// Parse `1`, `1.2` or `1.2.3` into a [`Version`].
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Parse a version that must be strict `major.minor.patch`.
pub fn parse_strict(raw: &str) -> Option<Version> {
    Version::parse(raw.trim()).ok()
}

/// `a < b` with lenient parsing; unparsable versions compare as lowest.
pub fn is_lower(a: &str, b: &str) -> bool {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a < b,
        (None, Some(_)) => true,
        _ => false,
    }
}

/// The next patch release after `version`.
pub fn next_patch(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch + 1)
}

/// Render a version as the underscore form used in release-note file names.
pub fn to_file_stem(version: &Version) -> String {
    format!("{}_{}_{}", version.major, version.minor, version.patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_versions() {
        assert_eq!(parse_version("5.5"), Some(Version::new(5, 5, 0)));
        assert_eq!(parse_version("6"), Some(Version::new(6, 0, 0)));
        assert_eq!(parse_version("6.10.1"), Some(Version::new(6, 10, 1)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_version(""), None);
        assert_eq!(parse_version("a.b"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
    }

    #[test]
    fn strict_requires_three_parts() {
        assert!(parse_strict("1.2").is_none());
        assert!(parse_strict("1.2.3").is_some());
    }

    #[test]
    fn compares_numerically() {
        assert!(is_lower("5.4.9", "5.5.0"));
        assert!(is_lower("6.9.0", "6.10.0"));
        assert!(!is_lower("5.5.0", "5.5"));
        assert!(is_lower("junk", "5.0.0"));
    }

    #[test]
    fn next_patch_increments() {
        assert_eq!(next_patch(&Version::new(1, 2, 3)), Version::new(1, 2, 4));
    }

    #[test]
    fn file_stem_uses_underscores() {
        assert_eq!(to_file_stem(&Version::new(2, 0, 5)), "2_0_5");
    }
}

//! Semver precedence comparison for update manifests.
//!
//! Wraps the `semver` crate's precedence rules (numeric vs lexicographic
//! prerelease identifiers, no-prerelease always outranks any prerelease) with
//! a leading `v` stripped before parsing, since release tags commonly carry
//! one and manifests shouldn't have to agree on the convention.

use std::cmp::Ordering;

use semver::Version;

use crate::error::DexterError;

/// Parses a version string, tolerating a leading `v` (`v1.2.3` == `1.2.3`).
pub fn parse_lenient(raw: &str) -> Result<Version, DexterError> {
    let trimmed = raw.strip_prefix('v').unwrap_or(raw);
    Version::parse(trimmed).map_err(|err| DexterError::Custom(format!("invalid version '{raw}': {err}")))
}

/// Compares two version strings by full semver precedence.
///
/// `cmp(a, b) == -cmp(b, a)` and `cmp(v, v) == Ordering::Equal` hold for any
/// valid inputs, mirroring `Ord`'s own contract.
pub fn compare(a: &str, b: &str) -> Result<Ordering, DexterError> {
    Ok(parse_lenient(a)?.cmp(&parse_lenient(b)?))
}

/// True if `candidate` is strictly newer than `current`.
pub fn is_newer(candidate: &str, current: &str) -> Result<bool, DexterError> {
    Ok(compare(candidate, current)? == Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v_prefix_is_ignored() {
        assert_eq!(compare("v1.2.3", "1.2.3").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_no_prerelease_outranks_prerelease() {
        assert!(is_newer("1.2.3", "1.2.3-beta.1").unwrap());
        assert!(!is_newer("1.2.3-beta.1", "1.2.3").unwrap());
    }

    #[test]
    fn test_numeric_prerelease_identifiers_compare_numerically() {
        assert!(is_newer("1.2.3-beta.10", "1.2.3-beta.9").unwrap());
    }

    #[test]
    fn test_lexicographic_prerelease_identifiers() {
        assert!(is_newer("1.2.3-rc.1", "1.2.3-beta.1").unwrap());
    }

    #[test]
    fn test_cmp_is_antisymmetric() {
        let a = "2.0.0-alpha.3";
        let b = "1.9.9";
        assert_eq!(compare(a, b).unwrap(), compare(b, a).unwrap().reverse());
    }

    #[test]
    fn test_cmp_self_is_equal() {
        assert_eq!(compare("1.4.0", "1.4.0").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_invalid_version_is_rejected() {
        assert!(parse_lenient("not-a-version").is_err());
    }
}

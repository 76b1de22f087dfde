//! Semver validation and npm range matching.
//!
//! Thin layer over the `semver` crate adding the npm-specific syntax the
//! registry serves in the wild:
//! - OR ranges: `^1.0.0 || ^2.0.0`
//! - Hyphen ranges: `1.0.0 - 2.0.0`
//! - Space-separated comparator lists: `>= 2.1.2 < 3.0.0`
//! - Wildcards and the empty range: `*`, `x`, `1.x`, `1.2.*`, ``

use semver::{Version, VersionReq};
use std::fmt;

/// Parse a concrete version, tolerating a leading `v`.
///
/// Returns `None` for ranges, tags, and anything else that is not a single
/// published version.
#[must_use]
pub fn valid(input: &str) -> Option<Version> {
    let input = input.trim();
    let input = input.strip_prefix('v').unwrap_or(input);
    Version::parse(input).ok()
}

/// Parse a version range, returning `None` when no alternative is usable.
#[must_use]
pub fn valid_range(input: &str) -> Option<Range> {
    Range::parse(input)
}

/// Whether `version` is a concrete version satisfying `range`.
///
/// False when either side fails to parse.
#[must_use]
pub fn satisfies(version: &str, range: &str) -> bool {
    match (valid(version), Range::parse(range)) {
        (Some(version), Some(range)) => range.matches(&version),
        _ => false,
    }
}

/// The greatest version from `versions` that satisfies `range`, returned
/// exactly as published.
pub fn max_satisfying<'a, I>(versions: I, range: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let range = Range::parse(range)?;

    let mut parsed: Vec<(Version, &str)> = versions
        .into_iter()
        .filter_map(|raw| valid(raw).map(|version| (version, raw)))
        .collect();

    // Highest first
    parsed.sort_by(|a, b| b.0.cmp(&a.0));

    parsed
        .into_iter()
        .find(|(version, _)| range.matches(version))
        .map(|(_, raw)| raw)
}

/// A parsed npm version range: one or more `||` alternatives.
///
/// Prereleases match only when the alternative itself carries a prerelease
/// tag, which is the `semver` crate's native rule.
#[derive(Debug, Clone)]
pub struct Range {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl Range {
    /// Parse a range. Invalid alternatives are skipped; a range with no
    /// usable alternative is invalid.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim().to_string();

        let alternatives: Vec<VersionReq> = raw.split("||").filter_map(parse_alternative).collect();

        if alternatives.is_empty() {
            return None;
        }

        Some(Self { raw, alternatives })
    }

    /// Whether any alternative matches `version`.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range as the caller wrote it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a single `||` alternative into a `VersionReq`.
fn parse_alternative(alt: &str) -> Option<VersionReq> {
    let alt = alt.trim();

    // npm treats the empty range and bare wildcards as "any version"
    if alt.is_empty() || alt == "*" || alt.eq_ignore_ascii_case("x") {
        return VersionReq::parse("*").ok();
    }

    // "1.0.0 - 2.0.0" is an inclusive bound pair
    if let Some((lo, hi)) = split_hyphen_range(alt) {
        return VersionReq::parse(&format!(">={lo}, <={hi}")).ok();
    }

    VersionReq::parse(&join_comparators(alt)).ok()
}

/// Split a hyphen range on the ` - ` delimiter (space-hyphen-space).
fn split_hyphen_range(alt: &str) -> Option<(&str, &str)> {
    let (lo, hi) = alt.split_once(" - ")?;
    let (lo, hi) = (lo.trim(), hi.trim());
    if lo.is_empty() || hi.is_empty() {
        return None;
    }
    Some((lo, hi))
}

/// npm separates AND-ed comparators with spaces; the `semver` crate wants
/// commas. Operators written apart from their operand (`>= 1.2.3`) are glued
/// back together first.
fn join_comparators(alt: &str) -> String {
    let mut comparators: Vec<String> = Vec::new();
    let mut dangling_op: Option<String> = None;

    for token in alt.split_whitespace() {
        let token = match dangling_op.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };

        if token.chars().all(|c| matches!(c, '>' | '<' | '=' | '~' | '^')) {
            dangling_op = Some(token);
        } else {
            comparators.push(token);
        }
    }

    if let Some(op) = dangling_op {
        // Trailing bare operator; hand it to VersionReq to reject
        comparators.push(op);
    }

    comparators.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_concrete() {
        assert_eq!(valid("1.2.3").unwrap().to_string(), "1.2.3");
        assert_eq!(valid("v4.18.2").unwrap().to_string(), "4.18.2");
        assert_eq!(valid(" 1.0.0 ").unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn test_valid_rejects_ranges_and_tags() {
        assert!(valid("1.x").is_none());
        assert!(valid("^1.2.3").is_none());
        assert!(valid("latest").is_none());
        assert!(valid("1.2").is_none());
        assert!(valid("").is_none());
    }

    #[test]
    fn test_valid_keeps_prerelease_and_build() {
        let version = valid("2.0.0-beta.1+build.5").unwrap();
        assert_eq!(version.pre.as_str(), "beta.1");
        assert_eq!(version.build.as_str(), "build.5");
    }

    #[test]
    fn test_valid_range_basic() {
        assert!(valid_range("^1.0.0").is_some());
        assert!(valid_range("~1.2.3").is_some());
        assert!(valid_range(">=1.0.0, <2.0.0").is_some());
        assert!(valid_range("1.2.3").is_some());
    }

    #[test]
    fn test_valid_range_rejects_garbage() {
        assert!(valid_range("not-a-range!!!").is_none());
        assert!(valid_range("invalid-version").is_none());
        assert!(valid_range("latest").is_none());
    }

    #[test]
    fn test_wildcard_ranges() {
        assert!(satisfies("0.0.1", "*"));
        assert!(satisfies("99.0.0", "x"));
        assert!(satisfies("1.5.0", ""));
        assert!(satisfies("1.5.0", "1.x"));
        assert!(!satisfies("2.0.0", "1.x"));
        assert!(satisfies("1.2.9", "1.2.*"));
        assert!(!satisfies("1.3.0", "1.2.*"));
    }

    #[test]
    fn test_caret_and_tilde() {
        assert!(satisfies("1.5.0", "^1.0.0"));
        assert!(!satisfies("2.0.0", "^1.0.0"));
        assert!(satisfies("1.0.5", "~1.0.0"));
        assert!(!satisfies("1.1.0", "~1.0.0"));
    }

    #[test]
    fn test_major_only_is_caret() {
        assert!(satisfies("2.5.0", "2"));
        assert!(!satisfies("3.0.0", "2"));
    }

    #[test]
    fn test_or_range() {
        assert!(satisfies("1.5.0", "^1.0.0 || ^2.0.0"));
        assert!(satisfies("2.5.0", "^1.0.0 || ^2.0.0"));
        assert!(!satisfies("3.0.0", "^1.0.0 || ^2.0.0"));
        // Spacing styles
        assert!(satisfies("15.0.0", "^14.0.0||^15.0.0"));
    }

    #[test]
    fn test_or_range_skips_invalid_alternative() {
        assert!(satisfies("1.5.0", "garbage || ^1.0.0"));
        assert!(valid_range("garbage || junk").is_none());
    }

    #[test]
    fn test_hyphen_range() {
        assert!(satisfies("1.0.0", "1.0.0 - 2.0.0"));
        assert!(satisfies("2.0.0", "1.0.0 - 2.0.0"));
        assert!(satisfies("1.5.0", "1.0.0 - 2.0.0"));
        assert!(!satisfies("2.0.1", "1.0.0 - 2.0.0"));
    }

    #[test]
    fn test_space_separated_comparators() {
        assert!(satisfies("2.5.0", ">= 2.1.2 < 3.0.0"));
        assert!(satisfies("2.1.2", ">= 2.1.2 < 3.0.0"));
        assert!(!satisfies("3.0.0", ">= 2.1.2 < 3.0.0"));
        assert!(satisfies("2.5.0", ">=2.1.2 <3.0.0"));
    }

    #[test]
    fn test_prerelease_opt_in() {
        assert!(!satisfies("2.0.0-alpha.1", "^2.0.0"));
        assert!(satisfies("2.0.0-beta.2", "^2.0.0-beta.1"));
        assert!(satisfies("2.0.0", "^2.0.0-beta.1"));
    }

    #[test]
    fn test_satisfies_unparseable_sides() {
        assert!(!satisfies("1.x", "^1.0.0"));
        assert!(!satisfies("1.0.0", "not a range !"));
    }

    #[test]
    fn test_max_satisfying_picks_highest() {
        let versions = ["1.0.0", "1.5.0", "2.0.0", "2.5.0"];
        assert_eq!(max_satisfying(versions, "^1.0.0"), Some("1.5.0"));
        assert_eq!(max_satisfying(versions, "^2.0.0"), Some("2.5.0"));
        assert_eq!(max_satisfying(versions, "*"), Some("2.5.0"));
    }

    #[test]
    fn test_max_satisfying_or_range() {
        let versions = ["1.5.0", "2.5.0"];
        assert_eq!(max_satisfying(versions, "^1.0.0 || ^2.0.0"), Some("2.5.0"));
        let low_only = ["1.0.0", "1.5.0"];
        assert_eq!(max_satisfying(low_only, "^1.0.0 || ^2.0.0"), Some("1.5.0"));
    }

    #[test]
    fn test_max_satisfying_none() {
        let versions = ["1.0.0", "2.0.0"];
        assert_eq!(max_satisfying(versions, "^3.0.0"), None);
        assert_eq!(max_satisfying(versions, "garbage"), None);
    }

    #[test]
    fn test_max_satisfying_skips_prereleases() {
        let versions = ["1.0.0", "2.0.0-alpha.1", "2.0.0-beta.1", "2.0.0"];
        assert_eq!(max_satisfying(versions, "^2.0.0"), Some("2.0.0"));
    }

    #[test]
    fn test_max_satisfying_returns_published_spelling() {
        // The winner comes back as the registry spelled it
        let versions = ["v1.2.0", "1.1.0"];
        assert_eq!(max_satisfying(versions, "^1.0.0"), Some("v1.2.0"));
    }

    #[test]
    fn test_range_display_round_trips_raw() {
        let range = Range::parse(" ^1.0.0 || ^2.0.0 ").unwrap();
        assert_eq!(range.as_str(), "^1.0.0 || ^2.0.0");
        assert_eq!(range.to_string(), "^1.0.0 || ^2.0.0");
    }
}

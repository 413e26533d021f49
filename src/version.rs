//! Loose semver comparison of release tags.

use std::cmp::Ordering;

use semver::Version;
use tracing::debug;

/// Returns `true` when `latest` is a strictly newer version than `current`.
///
/// An empty `latest` is never newer; anything is newer than an empty `current`.
/// One leading `v` is stripped from each side before comparing with semver
/// precedence (build metadata ignored). Strings that do not parse even loosely
/// compare as not newer.
pub fn newer_version(latest: &str, current: &str) -> bool {
    if latest.is_empty() {
        return false;
    }

    if current.is_empty() {
        return true;
    }

    match (parse_loose(latest), parse_loose(current)) {
        (Some(latest), Some(current)) => precedence(&latest, &current) == Ordering::Greater,
        _ => {
            debug!(latest, current, "unparseable version, treating as not newer");
            false
        }
    }
}

/// Parse a tag such as `v1.2` or `=1.2.3-rc.1` into a [`Version`].
///
/// Missing minor/patch components are filled with zero.
pub fn parse_loose(tag: &str) -> Option<Version> {
    let trimmed = tag.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    // Pad the numeric core only, leaving any pre-release or build suffix in place.
    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);
    let parts = core.split('.').count();
    if core.is_empty() || parts >= 3 {
        return None;
    }

    let padded = format!("{core}{}{suffix}", ".0".repeat(3 - parts));
    Version::parse(&padded).ok()
}

fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_plain_and_prefixed_versions() {
        assert!(newer_version("0.1.0", "0.0.1"));
        assert!(newer_version("v0.1.0", "v0.0.1"));
        assert!(newer_version("v0.0.1", ""));

        assert!(!newer_version("0.0.1", "0.0.1"));
        assert!(!newer_version("v0.0.1", "v0.0.1"));
        assert!(!newer_version("", "0.0.1"));
    }

    #[test]
    fn mixed_prefixes_compare_equal() {
        assert!(!newer_version("v1.2.3", "1.2.3"));
        assert!(newer_version("1.2.4", "v1.2.3"));
    }

    #[test]
    fn prerelease_is_older_than_release() {
        assert!(newer_version("1.0.0", "1.0.0-rc.1"));
        assert!(!newer_version("1.0.0-rc.1", "1.0.0"));
        assert!(newer_version("1.0.0-rc.2", "1.0.0-rc.1"));
        assert!(newer_version("1.0.0-beta", "1.0.0-alpha"));
    }

    #[test]
    fn build_metadata_is_ignored() {
        assert!(!newer_version("1.0.0+build.2", "1.0.0+build.1"));
        assert!(!newer_version("1.0.0+build.1", "1.0.0+build.2"));
    }

    #[test]
    fn short_versions_are_padded() {
        assert!(newer_version("v1.3", "1.2.9"));
        assert!(!newer_version("2", "2.0.0"));
        assert_eq!(parse_loose("v1.2-rc.1"), Version::parse("1.2.0-rc.1").ok());
    }

    #[test]
    fn garbage_is_never_newer() {
        assert!(!newer_version("nightly", "1.0.0"));
        assert!(!newer_version("1.0.0", "nightly"));
        assert!(!newer_version("v", "v"));
    }
}

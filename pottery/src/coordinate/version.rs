//! Version string helpers.
//!
//! Repository versions are free-form strings. Only two shapes get special
//! treatment: bracketed ranges (`[1,2)`, `(1.0,2.0]`) which are pinned to
//! their upper bound, and `major.minor(.patch)` prefixes which drive the
//! compatibility check used for conflict resolution.

use std::sync::OnceLock;

use regex::Regex;

/// Suffix marking a mutable, always-stale version.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Numeric prefix of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionParts {
    pub major: u64,
    pub minor: u64,
    /// Defaults to 0 when the version has no patch component.
    pub patch: u64,
}

/// Pattern: `<major>.<minor>[.<patch>]<anything>`
///
/// Example: `2.3.1`, `2.3`, `2.3.1-SNAPSHOT`, `5.10.0.Final`
fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?.*$").unwrap())
}

/// Pattern: an opening bracket, a lower bound, a comma, an upper bound and a
/// closing bracket. Open-ended ranges such as `[1.0,)` do not match.
fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[(\[].+,.+[)\]]$").unwrap())
}

impl VersionParts {
    /// Parse the numeric prefix of a version string.
    ///
    /// Returns `None` when the version does not start with `major.minor`.
    pub fn parse(version: &str) -> Option<Self> {
        let caps = numeric_pattern().captures(version.trim())?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Same major and minor line.
    pub fn same_line(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

/// Returns true if the version is a bracketed range.
pub fn is_range(version: &str) -> bool {
    range_pattern().is_match(version.trim())
}

/// Pin a version to a single value.
///
/// Ranges resolve to their upper bound with delimiters stripped; any other
/// version is returned verbatim.
pub fn decide(version: &str) -> &str {
    if !is_range(version) {
        return version;
    }

    version
        .split(',')
        .nth(1)
        .map(|upper| upper.trim().trim_end_matches([']', ')']).trim())
        .unwrap_or(version)
}

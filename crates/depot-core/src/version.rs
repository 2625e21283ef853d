//! Version tokens
//!
//! Maven-style version strings are free-form, so this module only knows
//! three things about them:
//! - whether a token is syntactically acceptable in a path or metadata file
//! - whether it names a snapshot (declared `X-SNAPSHOT` or resolved
//!   `X-yyyyMMdd.HHmmss-N`)
//! - how to order two tokens for display and "latest" selection

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// Qualifier marking a declared snapshot version
pub const SNAPSHOT: &str = "SNAPSHOT";

/// Suffix of a declared snapshot version
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+\-]*$").expect("valid regex"));

static TIMESTAMPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)-(\d{8}\.\d{6})-(\d+)$").expect("valid regex"));

/// Check that a version token is usable as a path segment and metadata entry
pub fn is_valid_version(version: &str) -> bool {
    VERSION_TOKEN.is_match(version)
}

/// True for both declared (`1.0-SNAPSHOT`) and resolved
/// (`1.0-20050611.112233-1`) snapshot versions
pub fn is_snapshot(version: &str) -> bool {
    version == SNAPSHOT || version.ends_with(SNAPSHOT_SUFFIX) || TIMESTAMPED.is_match(version)
}

/// A resolved snapshot version split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedVersion<'a> {
    /// Version without the `-SNAPSHOT` suffix, e.g. `1.0`
    pub prefix: &'a str,
    /// `yyyyMMdd.HHmmss`
    pub timestamp: &'a str,
    pub build_number: u32,
}

/// Split `X-yyyyMMdd.HHmmss-N` into its parts
pub fn parse_timestamped(version: &str) -> Option<TimestampedVersion<'_>> {
    let caps = TIMESTAMPED.captures(version)?;
    let prefix = caps.get(1)?.as_str();
    let timestamp = caps.get(2)?.as_str();
    let build_number = caps.get(3)?.as_str().parse().ok()?;
    Some(TimestampedVersion {
        prefix,
        timestamp,
        build_number,
    })
}

/// The declared version for a (possibly resolved) artifact version
///
/// `1.0-20050611.112233-1` becomes `1.0-SNAPSHOT`; anything else is
/// returned unchanged.
pub fn base_version(version: &str) -> String {
    match parse_timestamped(version) {
        Some(ts) => format!("{}{}", ts.prefix, SNAPSHOT_SUFFIX),
        None => version.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier(String),
}

/// Rank of well-known qualifiers; a plain release sits at `RELEASE_RANK`
fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

const RELEASE_RANK: u8 = 5;

fn flush(current: &mut String, digits: bool, items: &mut Vec<Item>) {
    if current.is_empty() {
        return;
    }
    let item = if digits {
        // Overlong numbers fall back to string ordering
        match current.parse() {
            Ok(n) => Item::Number(n),
            Err(_) => Item::Qualifier(current.clone()),
        }
    } else {
        Item::Qualifier(current.to_lowercase())
    };
    items.push(item);
    current.clear();
}

fn tokenize(version: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut digits = false;

    for c in version.chars() {
        if c == '.' || c == '-' || c == '_' {
            flush(&mut current, digits, &mut items);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != digits {
            flush(&mut current, digits, &mut items);
        }
        digits = is_digit;
        current.push(c);
    }
    flush(&mut current, digits, &mut items);
    items
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (Some(Item::Number(x)), Some(Item::Number(y))) => x.cmp(y),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => qualifier_rank(x)
            .cmp(&qualifier_rank(y))
            .then_with(|| x.cmp(y)),
        (Some(Item::Number(x)), None) => x.cmp(&0),
        (None, Some(Item::Number(y))) => 0.cmp(y),
        (Some(Item::Qualifier(x)), None) => qualifier_rank(x).cmp(&RELEASE_RANK),
        (None, Some(Item::Qualifier(y))) => RELEASE_RANK.cmp(&qualifier_rank(y)),
        (None, None) => Ordering::Equal,
    }
}

/// Total ordering of version tokens
///
/// Numeric segments compare numerically, qualifiers by their usual
/// maturity (`alpha < beta < milestone < rc < SNAPSHOT < release < sp`).
/// Tokens that compare equal that way (`1.0` and `1`) fall back to plain
/// string order so sorting stays deterministic.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = tokenize(a);
    let right = tokenize(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        match compare_items(left.get(i), right.get(i)) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.cmp(b)
}

/// Sort and de-duplicate a list of versions in place
pub fn sort_versions(versions: &mut Vec<String>) {
    versions.sort_by(|a, b| compare_versions(a, b));
    versions.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_detection() {
        assert!(is_snapshot("1.0-SNAPSHOT"));
        assert!(is_snapshot("1.0-20050611.112233-1"));
        assert!(is_snapshot("SNAPSHOT"));
        assert!(!is_snapshot("1.0"));
        assert!(!is_snapshot("1.0-beta-2"));
    }

    #[test]
    fn test_base_version() {
        assert_eq!(base_version("1.0-20050611.112233-1"), "1.0-SNAPSHOT");
        assert_eq!(base_version("2.1-alpha-1-20070101.000000-12"), "2.1-alpha-1-SNAPSHOT");
        assert_eq!(base_version("1.0-SNAPSHOT"), "1.0-SNAPSHOT");
        assert_eq!(base_version("1.0"), "1.0");
    }

    #[test]
    fn test_parse_timestamped() {
        let ts = parse_timestamped("1.0-20050611.112233-7").unwrap();
        assert_eq!(ts.prefix, "1.0");
        assert_eq!(ts.timestamp, "20050611.112233");
        assert_eq!(ts.build_number, 7);

        assert!(parse_timestamped("1.0-SNAPSHOT").is_none());
        assert!(parse_timestamped("1.0-2005.1-1").is_none());
    }

    #[test]
    fn test_valid_version_tokens() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("2.0-beta-1"));
        assert!(is_valid_version("1.0_01+build"));
        assert!(!is_valid_version(""));
        assert!(!is_valid_version("1.0 beta"));
        assert!(!is_valid_version("../1.0"));
        assert!(!is_valid_version("-1.0"));
    }

    #[test]
    fn test_compare_numeric_segments() {
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.0", "10.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_compare_qualifiers() {
        assert_eq!(compare_versions("1.0-alpha-1", "1.0-beta-1"), Ordering::Less);
        assert_eq!(compare_versions("1.0-rc-1", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0-SNAPSHOT", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0-SNAPSHOT", "1.0-rc-1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-sp-1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_compare_is_total() {
        assert_eq!(compare_versions("1.0", "1"), Ordering::Greater);
        assert_eq!(compare_versions("1", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_sort_versions() {
        let mut versions: Vec<String> = ["5.0", "0.9", "4.0", "1.0", "3.0", "2.0", "1.0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_versions(&mut versions);
        assert_eq!(versions, vec!["0.9", "1.0", "2.0", "3.0", "4.0", "5.0"]);
    }
}

//! npm-style version ranges (`>= 0.14.0 < 16`, `^1.2 || 2.x`, `1.2.3 - 2.3`)
//! translated into `semver` comparators.
//!
//! Each `||` alternative becomes one `VersionReq` whose comparators are built
//! explicitly, so a bare `1.2.3` means `=1.2.3` as in npm rather than Cargo's
//! caret default. Pre-release filtering is `VersionReq::matches`: a pre-release
//! version only satisfies a set that mentions the same `major.minor.patch`
//! with a pre-release tag.

use std::fmt;

use semver::{Comparator, Op, Prerelease, Version, VersionReq};

/// Operators that may be separated from their version by whitespace.
const OPERATORS: &[&str] = &[">=", "<=", ">", "<", "=", "~>", "~", "^"];

/// A parsed range expression. Keeps the source text for display and logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeSet {
    source: String,
    alternatives: Vec<VersionReq>,
}

impl RangeSet {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let alternatives = expr
            .split("||")
            .map(|alt| parse_comparator_set(alt.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: expr.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// One `VersionReq` per `||` alternative. An empty requirement matches
    /// every release version.
    pub fn alternatives(&self) -> &[VersionReq] {
        &self.alternatives
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse a concrete version, tolerating a leading `=` or `v` like npm does.
pub fn parse_version(text: &str) -> Option<Version> {
    let text = text.trim();
    let text = text.strip_prefix('=').unwrap_or(text).trim_start();
    let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
    Version::parse(text).ok()
}

/// Check if a concrete version satisfies a range expression.
/// Unparsable versions or ranges never match.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Some(version) = parse_version(version) else {
        return false;
    };
    match RangeSet::parse(range) {
        Ok(range) => range.matches(&version),
        Err(_) => false,
    }
}

fn parse_comparator_set(set: &str) -> Result<VersionReq, String> {
    let tokens: Vec<&str> = set.split_whitespace().collect();
    if let [low, "-", high] = tokens.as_slice() {
        return hyphen_range(low, high);
    }

    // ">= 15.0.0" -> ">=15.0.0"
    let mut merged = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        if OPERATORS.contains(&token) {
            let version = iter
                .next()
                .ok_or_else(|| format!("operator '{}' is missing a version", token))?;
            merged.push(format!("{}{}", token, version));
        } else {
            merged.push(token.to_string());
        }
    }

    let mut comparators = Vec::with_capacity(merged.len());
    for token in &merged {
        if let Some(cmp) = parse_comparator(token)? {
            comparators.push(cmp);
        }
    }
    Ok(VersionReq { comparators })
}

fn hyphen_range(low: &str, high: &str) -> Result<VersionReq, String> {
    let mut comparators = Vec::with_capacity(2);
    if let Some(partial) = parse_partial(low)? {
        comparators.push(partial.into_comparator(Op::GreaterEq));
    }
    if let Some(partial) = parse_partial(high)? {
        comparators.push(partial.into_comparator(Op::LessEq));
    }
    Ok(VersionReq { comparators })
}

fn split_operator(token: &str) -> (Option<Op>, &str) {
    // Two-character operators first so ">=" is not read as ">".
    let table = [
        (">=", Op::GreaterEq),
        ("<=", Op::LessEq),
        ("~>", Op::Tilde),
        (">", Op::Greater),
        ("<", Op::Less),
        ("=", Op::Exact),
        ("~", Op::Tilde),
        ("^", Op::Caret),
    ];
    for (prefix, op) in table {
        if let Some(rest) = token.strip_prefix(prefix) {
            return (Some(op), rest);
        }
    }
    (None, token)
}

/// `None` means the comparator is a full wildcard and constrains nothing.
fn parse_comparator(token: &str) -> Result<Option<Comparator>, String> {
    let (op, rest) = split_operator(token);
    let Some(partial) = parse_partial(rest)? else {
        return match op {
            Some(Op::Greater) | Some(Op::Less) => {
                Err(format!("'{}' can never be satisfied", token))
            }
            _ => Ok(None),
        };
    };
    let op = match op {
        Some(op) => op,
        None if partial.is_complete() => Op::Exact,
        None => Op::Wildcard,
    };
    Ok(Some(partial.into_comparator(op)))
}

/// A version with optional trailing components (`1`, `1.2`, `1.2.3-beta.1`).
struct Partial {
    major: u64,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn is_complete(&self) -> bool {
        self.minor.is_some() && self.patch.is_some()
    }

    fn into_comparator(self, op: Op) -> Comparator {
        Comparator {
            op,
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre: self.pre,
        }
    }
}

fn parse_partial(text: &str) -> Result<Option<Partial>, String> {
    let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
    let text = text.split('+').next().unwrap_or(text);
    let (core, pre) = match text.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (text, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(format!("too many version components in '{}'", text));
    }
    let mut numbers = Vec::with_capacity(3);
    for part in &parts {
        match *part {
            "x" | "X" | "*" => break,
            part => numbers.push(
                part.parse::<u64>()
                    .map_err(|_| format!("invalid version component '{}' in '{}'", part, text))?,
            ),
        }
    }

    let pre = match pre {
        Some(pre) if numbers.len() == 3 => Prerelease::new(pre)
            .map_err(|e| format!("invalid pre-release '{}' in '{}': {}", pre, text, e))?,
        Some(pre) => {
            return Err(format!(
                "pre-release '{}' requires a full version in '{}'",
                pre, text
            ))
        }
        None => Prerelease::EMPTY,
    };

    Ok(match numbers.as_slice() {
        [] => None,
        [major] => Some(Partial {
            major: *major,
            minor: None,
            patch: None,
            pre,
        }),
        [major, minor] => Some(Partial {
            major: *major,
            minor: Some(*minor),
            patch: None,
            pre,
        }),
        [major, minor, patch, ..] => Some(Partial {
            major: *major,
            minor: Some(*minor),
            patch: Some(*patch),
            pre,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(expr: &str) -> RangeSet {
        RangeSet::parse(expr).unwrap()
    }

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap()
    }

    #[test]
    fn test_bare_version_is_exact() {
        let r = range("1.2.3");
        assert!(r.matches(&v("1.2.3")));
        assert!(!r.matches(&v("1.2.4")));
        assert!(!r.matches(&v("1.3.0")));
    }

    #[test]
    fn test_operator_with_space() {
        let r = range(">= 0.14.0 < 16.0.0");
        assert!(r.matches(&v("0.14.0")));
        assert!(r.matches(&v("15.6.2")));
        assert!(!r.matches(&v("0.13.3")));
        assert!(!r.matches(&v("16.0.0")));
    }

    #[test]
    fn test_partial_and_x_ranges() {
        assert!(range("15").matches(&v("15.4.1")));
        assert!(!range("15").matches(&v("16.0.0")));
        assert!(range("15.x").matches(&v("15.0.0")));
        assert!(range("1.2.*").matches(&v("1.2.9")));
        assert!(!range("1.2.*").matches(&v("1.3.0")));
        assert!(range(">=2").matches(&v("2.0.0")));
        assert!(!range(">2").matches(&v("2.9.9")));
        assert!(range(">2").matches(&v("3.0.0")));
        assert!(range("<=1.4").matches(&v("1.4.7")));
        assert!(!range("<=1.4").matches(&v("1.5.0")));
    }

    #[test]
    fn test_caret_and_tilde() {
        assert!(range("^1.2.0").matches(&v("1.9.0")));
        assert!(!range("^1.2.0").matches(&v("2.0.0")));
        assert!(range("^0.2.3").matches(&v("0.2.9")));
        assert!(!range("^0.2.3").matches(&v("0.3.0")));
        assert!(range("~1.2.3").matches(&v("1.2.8")));
        assert!(!range("~1.2.3").matches(&v("1.3.0")));
        assert!(range("~>1.2").matches(&v("1.2.0")));
    }

    #[test]
    fn test_alternatives() {
        let r = range("^1.0.0 || >= 3.0.0 < 4");
        assert!(r.matches(&v("1.5.0")));
        assert!(!r.matches(&v("2.0.0")));
        assert!(r.matches(&v("3.2.1")));
        assert_eq!(r.alternatives().len(), 2);
    }

    #[test]
    fn test_hyphen_range() {
        let r = range("1.2.3 - 2.3");
        assert!(r.matches(&v("1.2.3")));
        assert!(r.matches(&v("2.3.9")));
        assert!(!r.matches(&v("2.4.0")));
        assert!(!r.matches(&v("1.2.2")));
    }

    #[test]
    fn test_wildcards_match_releases_only() {
        for expr in ["*", "", "x", ">= *"] {
            let r = range(expr);
            assert!(r.matches(&v("0.0.1")), "{expr}");
            assert!(r.matches(&v("99.1.0")), "{expr}");
            assert!(!r.matches(&v("1.0.0-rc.1")), "{expr}");
        }
    }

    #[test]
    fn test_prerelease_requires_same_tuple() {
        let r = range(">= 16.0.0-alpha.7");
        assert!(r.matches(&v("16.0.0-beta.1")));
        assert!(r.matches(&v("16.0.0")));
        assert!(r.matches(&v("18.2.0")));
        assert!(!r.matches(&v("16.0.0-alpha.3")));
        assert!(!r.matches(&v("17.0.0-rc.0")));

        let upper = range(">= 0.14.0 < 16.0.0-beta.1");
        assert!(upper.matches(&v("16.0.0-alpha.13")));
        assert!(!upper.matches(&v("16.0.0-beta.1")));
        assert!(!upper.matches(&v("15.0.0-rc.2")));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(RangeSet::parse(">= banana").is_err());
        assert!(RangeSet::parse("1.2.3.4").is_err());
        assert!(RangeSet::parse(">=").is_err());
        assert!(RangeSet::parse("1.2-beta").is_err());
        assert!(RangeSet::parse("<*").is_err());
    }

    #[test]
    fn test_satisfies_free_function() {
        assert!(satisfies("15.0.0", ">= 0.14.0 < 16.0.0"));
        assert!(satisfies("v15.0.0", "15.x"));
        assert!(!satisfies("not-a-version", "*"));
        assert!(!satisfies("1.0.0", ">= banana"));
    }

    #[test]
    fn test_parse_version_prefixes() {
        assert_eq!(parse_version("v1.2.3"), Some(v("1.2.3")));
        assert_eq!(parse_version("= 1.2.3"), Some(v("1.2.3")));
        assert_eq!(parse_version("1.2"), None);
    }

    #[test]
    fn test_display_keeps_source() {
        assert_eq!(range(">= 15 < 16").to_string(), ">= 15 < 16");
    }
}

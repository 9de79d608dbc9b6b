//! Semantic versions and version ranges for the `version` dimension.
//!
//! Routes register exact versions (`1.2.0`); requests ask for ranges
//! (`1.x`, `^1.2.0`, `>=2.0.0`). Ordering follows major, minor, patch
//! precedence.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constraints::store::ConstraintStore;
use crate::routing::mask::RouteMask;

/// An exact `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Why a version or range string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError(String);

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for VersionParseError {}

fn parse_number(part: &str, input: &str) -> Result<u64, VersionParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError(format!("{input:?} is not a numeric version component")));
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err(VersionParseError(format!("{input:?} has a leading zero")));
    }
    part.parse()
        .map_err(|_| VersionParseError(format!("{input:?} is out of range")))
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionParseError(format!(
                "{input:?} must have the form MAJOR.MINOR.PATCH"
            )));
        }
        Ok(Version {
            major: parse_number(parts[0], input)?,
            minor: parse_number(parts[1], input)?,
            patch: parse_number(parts[2], input)?,
        })
    }
}

/// A set of acceptable versions requested at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    /// `*` or `x`.
    Any,
    /// `N`, `N.x`, `N.x.x`.
    Major(u64),
    /// `N.M`, `N.M.x`.
    Minor(u64, u64),
    /// `N.M.P` or `=N.M.P`.
    Exact(Version),
    /// `^N.M.P`: no change to the leftmost non-zero component.
    Caret(Version),
    /// `~N.M.P`: same major and minor, patch at least P.
    Tilde(Version),
    /// `>N.M.P`, `>=N.M.P`, `<N.M.P`, `<=N.M.P`.
    Compare(Ordering, bool, Version),
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

impl VersionRange {
    /// True if `version` is inside this range.
    pub fn contains(&self, version: &Version) -> bool {
        match self {
            VersionRange::Any => true,
            VersionRange::Major(major) => version.major == *major,
            VersionRange::Minor(major, minor) => version.major == *major && version.minor == *minor,
            VersionRange::Exact(exact) => version == exact,
            VersionRange::Caret(base) => {
                if version < base {
                    return false;
                }
                if base.major > 0 {
                    version.major == base.major
                } else if base.minor > 0 {
                    version.major == 0 && version.minor == base.minor
                } else {
                    version.major == 0 && version.minor == 0 && version.patch == base.patch
                }
            }
            VersionRange::Tilde(base) => {
                version >= base && version.major == base.major && version.minor == base.minor
            }
            VersionRange::Compare(ordering, inclusive, base) => {
                let cmp = version.cmp(base);
                cmp == *ordering || (*inclusive && cmp == Ordering::Equal)
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionParseError("empty version range".to_string()));
        }

        let operators: [(&str, fn(Version) -> VersionRange); 7] = [
            (">=", |v| VersionRange::Compare(Ordering::Greater, true, v)),
            ("<=", |v| VersionRange::Compare(Ordering::Less, true, v)),
            (">", |v| VersionRange::Compare(Ordering::Greater, false, v)),
            ("<", |v| VersionRange::Compare(Ordering::Less, false, v)),
            ("=", VersionRange::Exact),
            ("^", VersionRange::Caret),
            ("~", VersionRange::Tilde),
        ];
        for (prefix, build) in operators {
            if let Some(rest) = input.strip_prefix(prefix) {
                return Ok(build(rest.trim().parse()?));
            }
        }

        let parts: Vec<&str> = input.split('.').collect();
        match parts.as_slice() {
            [any] if is_wildcard(any) => Ok(VersionRange::Any),
            [major] => Ok(VersionRange::Major(parse_number(major, input)?)),
            [major, minor] if is_wildcard(minor) => {
                Ok(VersionRange::Major(parse_number(major, input)?))
            }
            [major, minor] => Ok(VersionRange::Minor(
                parse_number(major, input)?,
                parse_number(minor, input)?,
            )),
            [major, minor, patch] if is_wildcard(minor) && is_wildcard(patch) => {
                Ok(VersionRange::Major(parse_number(major, input)?))
            }
            [major, minor, patch] if is_wildcard(patch) => Ok(VersionRange::Minor(
                parse_number(major, input)?,
                parse_number(minor, input)?,
            )),
            [_, _, _] => Ok(VersionRange::Exact(input.parse()?)),
            _ => Err(VersionParseError(format!("{input:?} is not a version range"))),
        }
    }
}

/// Store for the `version` dimension, ordered by version precedence.
#[derive(Debug, Default)]
pub struct VersionStore {
    versions: BTreeMap<Version, RouteMask>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConstraintStore for VersionStore {
    fn get(&self, value: &str) -> Option<RouteMask> {
        let range: VersionRange = value.parse().ok()?;
        let mut found = RouteMask::new();
        for (version, mask) in &self.versions {
            if range.contains(version) {
                found.union_with(mask);
            }
        }
        (!found.is_empty()).then_some(found)
    }

    fn set(&mut self, value: &str, entry: RouteMask) {
        match value.parse::<Version>() {
            Ok(version) => {
                self.versions.insert(version, entry);
            }
            Err(e) => tracing::warn!(value, error = %e, "Ignoring unparseable version key"),
        }
    }

    fn del(&mut self, value: &str) {
        if let Ok(version) = value.parse::<Version>() {
            self.versions.remove(&version);
        }
    }

    fn empty(&mut self) {
        self.versions.clear();
    }

    /// Keys must be exact versions; a strategy backed by this store should
    /// normalize to the canonical `MAJOR.MINOR.PATCH` form.
    fn validate(&self, value: &str) -> Result<(), String> {
        value
            .parse::<Version>()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Picks the highest satisfying version among the candidates.
    fn prefer(&self, value: &str, candidates: &RouteMask) -> RouteMask {
        let Ok(range) = value.parse::<VersionRange>() else {
            return candidates.clone();
        };
        self.versions
            .iter()
            .rev()
            .filter(|(version, _)| range.contains(version))
            .map(|(_, mask)| mask.intersection(candidates))
            .find(|hit| !hit.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn r(s: &str) -> VersionRange {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(v("1.2.3"), Version::new(1, 2, 3));
        assert_eq!(v(" 10.0.7 "), Version::new(10, 0, 7));
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("1.x.0".parse::<Version>().is_err());
        assert!("01.2.3".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
    }

    #[test]
    fn test_precedence() {
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.9.9") < v("1.10.0"));
        assert!(v("2.0.0") > v("1.99.99"));
    }

    #[test]
    fn test_wildcard_ranges() {
        assert!(r("1.x").contains(&v("1.0.0")));
        assert!(r("1.x").contains(&v("1.7.3")));
        assert!(!r("1.x").contains(&v("2.0.0")));
        assert!(r("1").contains(&v("1.4.0")));
        assert!(r("1.x.x").contains(&v("1.4.0")));
        assert!(r("1.2.x").contains(&v("1.2.9")));
        assert!(!r("1.2.x").contains(&v("1.3.0")));
        assert!(r("1.2").contains(&v("1.2.0")));
        assert!(r("*").contains(&v("42.0.0")));
        assert!(r("x").contains(&v("0.0.1")));
    }

    #[test]
    fn test_exact_and_operator_ranges() {
        assert!(r("1.2.3").contains(&v("1.2.3")));
        assert!(!r("1.2.3").contains(&v("1.2.4")));
        assert!(r("=1.2.3").contains(&v("1.2.3")));

        assert!(r("^1.2.0").contains(&v("1.9.0")));
        assert!(!r("^1.2.0").contains(&v("1.1.0")));
        assert!(!r("^1.2.0").contains(&v("2.0.0")));
        assert!(r("^0.3.1").contains(&v("0.3.5")));
        assert!(!r("^0.3.1").contains(&v("0.4.0")));
        assert!(!r("^0.0.3").contains(&v("0.0.4")));

        assert!(r("~1.2.3").contains(&v("1.2.9")));
        assert!(!r("~1.2.3").contains(&v("1.3.0")));

        assert!(r(">=2.0.0").contains(&v("2.0.0")));
        assert!(!r(">2.0.0").contains(&v("2.0.0")));
        assert!(r("<2.0.0").contains(&v("1.9.9")));
        assert!(r("<=2.0.0").contains(&v("2.0.0")));
        assert!(!r("<2.0.0").contains(&v("2.0.0")));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!("".parse::<VersionRange>().is_err());
        assert!("latest".parse::<VersionRange>().is_err());
        assert!("1.2.3.4".parse::<VersionRange>().is_err());
        assert!("^1.x".parse::<VersionRange>().is_err());
    }

    #[test]
    fn test_store_get_unions_satisfying_versions() {
        let mut store = VersionStore::new();
        store.set("1.0.0", RouteMask::single(0));
        store.set("1.2.0", RouteMask::single(1));
        store.set("2.0.0", RouteMask::single(2));

        let hit = store.get("1.x").unwrap();
        assert_eq!(hit.iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(store.get("2.x"), Some(RouteMask::single(2)));
        assert!(store.get("3.x").is_none());
        assert!(store.get("garbage").is_none());
    }

    #[test]
    fn test_store_prefers_highest_version_among_candidates() {
        let mut store = VersionStore::new();
        store.set("1.0.0", RouteMask::single(0));
        store.set("1.2.0", RouteMask::single(1));

        let all: RouteMask = [0, 1].into_iter().collect();
        assert_eq!(store.prefer("1.x", &all), RouteMask::single(1));
        assert_eq!(store.prefer("1.x", &RouteMask::single(0)), RouteMask::single(0));
        assert!(store.prefer("3.x", &all).is_empty());
        assert_eq!(store.prefer("garbage", &all), all);
    }

    #[test]
    fn test_store_validates_exact_versions() {
        let store = VersionStore::new();
        assert!(store.validate("1.0.0").is_ok());
        assert!(store.validate("1.x").is_err());
        assert!(store.validate("^1.0.0").is_err());
    }

    #[test]
    fn test_store_del_and_empty() {
        let mut store = VersionStore::new();
        store.set("1.0.0", RouteMask::single(0));
        store.set("2.0.0", RouteMask::single(1));
        store.del("1.0.0");
        assert!(store.get("1.x").is_none());
        store.empty();
        assert!(store.get("*").is_none());
    }
}

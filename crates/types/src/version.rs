//! Version constraint parsing and matching
//!
//! Constraint grammar:
//! - `==1.2.3` or bare `1.2.3` - exact version
//! - `>=1.2.0`, `>1.2.0`, `<=2.0.0`, `<2.0.0` - bounds
//! - `~=1.2.0` - compatible release (same major.minor, at least the given patch)
//! - `*` or empty - unconstrained ("latest")
//! - Multiple constraints joined by commas: `>=1.2,<2.0`

use crate::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use toolchest_errors::VersionError;

/// A single version constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionConstraint {
    Exact(Version),
    GreaterEqual(Version),
    Greater(Version),
    LessEqual(Version),
    Less(Version),
    Compatible(Version),
}

impl VersionConstraint {
    /// Check if a version satisfies this constraint
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Exact(v) => version == v,
            Self::GreaterEqual(v) => version >= v,
            Self::Greater(v) => version > v,
            Self::LessEqual(v) => version <= v,
            Self::Less(v) => version < v,
            Self::Compatible(v) => {
                version >= v && version.major == v.major && version.minor == v.minor
            }
        }
    }

    fn parse(s: &str) -> Result<Self, VersionError> {
        const OPS: &[(&str, fn(Version) -> VersionConstraint)] = &[
            ("==", VersionConstraint::Exact),
            (">=", VersionConstraint::GreaterEqual),
            ("<=", VersionConstraint::LessEqual),
            ("~=", VersionConstraint::Compatible),
            (">", VersionConstraint::Greater),
            ("<", VersionConstraint::Less),
        ];

        let s = s.trim();
        for (op, make) in OPS {
            if let Some(rest) = s.strip_prefix(op) {
                let version =
                    Version::parse(rest.trim()).map_err(|e| VersionError::ParseError {
                        message: e.to_string(),
                    })?;
                return Ok(make(version));
            }
        }

        // A bare version is treated as an exact pin
        let version = Version::parse(s).map_err(|_| VersionError::InvalidConstraint {
            input: s.to_string(),
        })?;
        Ok(Self::Exact(version))
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "=={v}"),
            Self::GreaterEqual(v) => write!(f, ">={v}"),
            Self::Greater(v) => write!(f, ">{v}"),
            Self::LessEqual(v) => write!(f, "<={v}"),
            Self::Less(v) => write!(f, "<{v}"),
            Self::Compatible(v) => write!(f, "~={v}"),
        }
    }
}

/// A version range: zero or more constraints that must all hold
///
/// An empty constraint list means "any version" and resolves to the
/// highest candidate available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSpec {
    constraints: Vec<VersionConstraint>,
}

impl VersionSpec {
    /// The unconstrained spec ("latest")
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// A spec pinned to exactly one version
    #[must_use]
    pub fn exact(version: Version) -> Self {
        Self {
            constraints: vec![VersionConstraint::Exact(version)],
        }
    }

    /// Check if a version satisfies all constraints
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }

    /// Whether this spec accepts any version
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Pick the highest candidate satisfying this spec
    #[must_use]
    pub fn best_match<I>(&self, candidates: I) -> Option<Version>
    where
        I: IntoIterator<Item = Version>,
    {
        candidates
            .into_iter()
            .filter(|v| self.matches(v))
            .max()
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::any());
        }

        let constraints = s
            .split(',')
            .map(VersionConstraint::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { constraints })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            f.write_str("*")
        } else {
            let strs: Vec<_> = self.constraints.iter().map(ToString::to_string).collect();
            f.write_str(&strs.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_exact_constraint() {
        let spec = VersionSpec::from_str("==1.2.3").unwrap();
        assert!(spec.matches(&v("1.2.3")));
        assert!(!spec.matches(&v("1.2.4")));
    }

    #[test]
    fn test_bare_version_is_exact() {
        let spec = VersionSpec::from_str("1.2.3").unwrap();
        assert_eq!(spec, VersionSpec::exact(v("1.2.3")));
    }

    #[test]
    fn test_range_constraints() {
        let spec = VersionSpec::from_str(">=1.2.0,<2.0.0").unwrap();
        assert!(!spec.matches(&v("1.1.9")));
        assert!(spec.matches(&v("1.2.0")));
        assert!(spec.matches(&v("1.9.9")));
        assert!(!spec.matches(&v("2.0.0")));
    }

    #[test]
    fn test_compatible_constraint() {
        let spec = VersionSpec::from_str("~=1.2.3").unwrap();
        assert!(spec.matches(&v("1.2.3")));
        assert!(spec.matches(&v("1.2.9")));
        assert!(!spec.matches(&v("1.3.0")));
    }

    #[test]
    fn test_any_version() {
        let spec = VersionSpec::from_str("*").unwrap();
        assert!(spec.is_any());
        assert!(spec.matches(&v("0.0.1")));
        assert!(spec.matches(&v("999.999.999")));
    }

    #[test]
    fn test_best_match_picks_highest() {
        let spec = VersionSpec::from_str(">=1.0.0,<2.0.0").unwrap();
        let best = spec.best_match(vec![v("0.9.0"), v("1.2.0"), v("1.9.1"), v("2.1.0")]);
        assert_eq!(best, Some(v("1.9.1")));
    }

    #[test]
    fn test_best_match_none() {
        let spec = VersionSpec::from_str(">=3.0.0").unwrap();
        assert_eq!(spec.best_match(vec![v("1.0.0"), v("2.0.0")]), None);
    }

    #[test]
    fn test_display_round_trip() {
        for input in ["*", "==1.2.3", ">=1.2.0,<2.0.0", "~=1.4.0"] {
            let spec = VersionSpec::from_str(input).unwrap();
            assert_eq!(spec, VersionSpec::from_str(&spec.to_string()).unwrap());
        }
    }
}

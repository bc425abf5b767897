//! Pinned package version type.
//!
//! Registry rows store exact pins ("1.2.3", optionally written "^1.2.3" in
//! manifests), so this is a standalone three-component comparator rather
//! than a range matcher.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::SprigError;

/// Pinned version (major.minor.patch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True iff `self` is strictly newer than `other`.
    ///
    /// This is the bump predicate: a parent repository needs a pull request
    /// exactly when the published version is greater than its pin.
    pub fn greater_than(&self, other: &Version) -> bool {
        self.as_tuple() > other.as_tuple()
    }

    fn as_tuple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Manifests write pins with a leading caret; the pin itself is exact.
        let input = s.trim();
        let core = input.strip_prefix('^').unwrap_or(input);

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(SprigError::VersionFormat {
                input: input.to_string(),
            });
        }

        let parse = |part: &str| {
            part.parse::<u64>().map_err(|_| SprigError::VersionComponent {
                component: part.to_string(),
            })
        };

        Ok(Version {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_tuple().cmp(&other.as_tuple())
    }
}

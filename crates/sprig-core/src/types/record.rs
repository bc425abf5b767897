//! Registry record types.
//!
//! One record per repository+package: the manifest pins the registry knows
//! about, used to answer "who depends on the package that just published?".

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dependency map as stored: dependency name -> pinned version string
pub type DependencyMap = IndexMap<String, String>;

/// One registry row describing a repository's manifest pins.
///
/// `package_name` is the globally unique key; a store write fully replaces
/// any prior record for it (last writer wins, no merge, no history).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageRecord {
    pub package_name: String,
    pub repo_name: String,
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default)]
    pub dev_dependencies: DependencyMap,
}

impl PackageRecord {
    /// Create a record with empty dependency maps
    pub fn new(package_name: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            repo_name: repo_name.into(),
            dependencies: DependencyMap::new(),
            dev_dependencies: DependencyMap::new(),
        }
    }

    /// The version string this record pins for `name`, if any.
    ///
    /// Runtime dependencies shadow dev dependencies, matching how the bump
    /// flow rewrites manifests.
    pub fn pinned_version_of(&self, name: &str) -> Option<&str> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
            .map(String::as_str)
    }

    /// Whether this record mentions `name` in either dependency map
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }
}

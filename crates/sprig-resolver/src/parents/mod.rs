//! Direct-parent resolution over registry records.
//!
//! A record is a parent of the updated package when it pins that package (in
//! either dependency map) at a version strictly older than the published one.
//! Pins that do not parse as plain `major.minor.patch` versions are skipped:
//! the registry stores exact pins, and anything else is not a bump candidate.

use std::collections::HashSet;
use std::str::FromStr;

use tracing::debug;

use sprig_core::{PackageRecord, Version};

/// Records whose pin on `updated_name` is strictly older than
/// `updated_version`.
///
/// Direct parents only; no transitive walk.
pub fn find_parents<'a>(
    records: &'a [PackageRecord],
    updated_name: &str,
    updated_version: &Version,
) -> Vec<&'a PackageRecord> {
    let parents: Vec<&PackageRecord> = records
        .iter()
        .filter(|record| needs_bump(record, updated_name, updated_version))
        .collect();

    debug!(
        package = updated_name,
        version = %updated_version,
        parents = parents.len(),
        "resolved direct parents"
    );
    parents
}

/// Transitive closure of `find_parents`: parents, their parents, and so on.
///
/// Not wired into the primary bump flow; exposed for callers that want
/// cascade bumps. The visited set is keyed by package name so dependency
/// cycles terminate.
pub fn find_all_parents<'a>(
    records: &'a [PackageRecord],
    updated_name: &str,
    updated_version: &Version,
) -> Vec<&'a PackageRecord> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut result: Vec<&PackageRecord> = Vec::new();
    visited.insert(updated_name);

    let mut frontier = vec![updated_name];
    while let Some(name) = frontier.pop() {
        // Transitive levels have no published version to compare against;
        // any pin on an already-bumped package qualifies.
        for record in records.iter().filter(|r| {
            if name == updated_name {
                needs_bump(r, name, updated_version)
            } else {
                r.depends_on(name)
            }
        }) {
            if visited.insert(&record.package_name) {
                result.push(record);
                frontier.push(&record.package_name);
            }
        }
    }

    result
}

fn needs_bump(record: &PackageRecord, updated_name: &str, updated_version: &Version) -> bool {
    let Some(pin) = record.pinned_version_of(updated_name) else {
        return false;
    };
    match Version::from_str(pin) {
        Ok(pinned) => updated_version.greater_than(&pinned),
        Err(_) => false,
    }
}

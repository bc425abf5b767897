//! Queue job types.
//!
//! Jobs arrive as serialized JSON with a `request_type` discriminator.
//! They are transient: consumed with a small bounded number of delivery
//! attempts before the queue moves them to a dead-letter destination.

use serde::{Deserialize, Serialize};

use super::record::DependencyMap;
use crate::error::SprigResult;

/// A raw queue delivery: the item identifier plus its serialized payload.
///
/// The identifier is what gets reported back on failure so the queue
/// redelivers only that item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawJob {
    pub id: String,
    pub body: String,
}

/// Manifest-shaped dependency payload as published alongside a package.
///
/// `devDependencies` is camelCase on the wire because publishers send the
/// relevant slice of their manifest verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorePayload {
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: DependencyMap,
}

/// A unit of work, dispatched on `request_type`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum Job {
    /// Record (or fully replace) one repository's manifest pins
    StoreDependency {
        repository: String,
        package_name: String,
        dependencies: Option<StorePayload>,
    },
    /// A package published `updated_package_version`; bump every parent
    BumpParents {
        updated_package_name: String,
        updated_package_version: String,
    },
}

impl Job {
    /// Parse a serialized job body.
    ///
    /// Malformed JSON and unknown `request_type` values both fail here, as
    /// item-scoped errors.
    pub fn parse(body: &str) -> SprigResult<Job> {
        Ok(serde_json::from_str(body)?)
    }
}

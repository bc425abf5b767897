//! Core data types for the Sprig bump pipeline.
//!
//! This module provides the fundamental types used throughout Sprig:
//! - Version type with the pinned-version comparison
//! - PackageRecord, one registry row per repository manifest
//! - Job types consumed from the event queue

pub mod job;
pub mod record;
pub mod version;

// Re-export all public types
pub use job::{Job, RawJob, StorePayload};
pub use record::{DependencyMap, PackageRecord};
pub use version::Version;

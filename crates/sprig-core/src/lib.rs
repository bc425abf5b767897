//! # sprig-core
//!
//! Core types and error handling shared across all Sprig crates.
//!
//! This crate provides:
//! - Version type with the three-component comparison used for bump decisions
//! - PackageRecord, the registry row describing one repository's manifest pins
//! - Job types delivered by the event queue
//! - SprigError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, PackageRecord, Job)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SprigError, SprigResult};
pub use types::{Job, PackageRecord, RawJob, StorePayload, Version};

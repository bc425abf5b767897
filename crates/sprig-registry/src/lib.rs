//! Dependency registry for Sprig
//!
//! This crate persists per-repository package records and reads them back in
//! bulk for parent resolution. The backend is addressed through the
//! `DependencyStore` trait; an HTTP key-value implementation and an
//! in-memory fake are provided.

pub mod store;

// Re-export main types
pub use store::{DependencyRegistry, DependencyStore, HttpDependencyStore, MemoryDependencyStore};

use sprig_core::error::SprigError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, SprigError>;

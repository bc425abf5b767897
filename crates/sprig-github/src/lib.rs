//! GitHub integration for Sprig
//!
//! This crate provides the version-control side of the bump pipeline:
//! a rate-limit-aware REST client, the idempotent git write protocol
//! (branch / stage / tree / commit / fast-forward ref), pull-request
//! upsert, and the staging area driving the external manifest-update tool.

pub mod api;
pub mod client;
pub mod protocol;
pub mod pulls;
pub mod staging;

// Re-export main types
pub use client::{GithubClient, GithubConfig, RetryConfig};
pub use protocol::{BranchState, GitWriteProtocol, PushedBump};
pub use pulls::upsert_pull_request;
pub use staging::{ManifestUpdater, StagingArea};

use sprig_core::error::SprigError;

/// Result type for GitHub operations
pub type GithubResult<T> = Result<T, SprigError>;

//! Batch job processing for Sprig
//!
//! This crate turns a delivered batch of queue jobs into isolated,
//! retryable units of work: configuration validation, per-job dispatch to
//! the store and bump flows, and the partial-batch-failure report the
//! queue infrastructure uses to redeliver only what failed.

pub mod config;
pub mod processor;

// Re-export main types
pub use config::WorkerConfig;
pub use processor::{handle_batch, BatchProcessor, BatchReport};

use sprig_core::error::SprigError;

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, SprigError>;

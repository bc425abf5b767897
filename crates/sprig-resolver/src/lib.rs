//! Parent resolution for Sprig
//!
//! Given the full registry record set and a freshly published
//! package+version, this crate computes which repositories need a bump
//! pull request.

pub mod parents;

// Re-export main operations
pub use parents::{find_all_parents, find_parents};

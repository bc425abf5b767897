//! Registry store trait and the operations built on it.
//!
//! Guarantees:
//! - `put_record` fully replaces any prior record under the same
//!   `package_name` (last writer wins, single-key put, no transactionality).
//! - `scan_all` returns every record, following backend pagination
//!   transparently.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use sprig_core::{PackageRecord, SprigError, StorePayload};

use crate::RegistryResult;

mod http;
mod memory;

pub use http::HttpDependencyStore;
pub use memory::MemoryDependencyStore;


/// Key-value backend for package records, keyed by `package_name`
#[async_trait]
pub trait DependencyStore: Send + Sync {
    /// Persist a record, fully replacing any prior record under its key
    async fn put_record(&self, record: &PackageRecord) -> RegistryResult<()>;

    /// Return every record currently stored
    async fn scan_all(&self) -> RegistryResult<Vec<PackageRecord>>;
}

/// The dependency registry: payload validation plus a store backend
#[derive(Clone)]
pub struct DependencyRegistry {
    store: Arc<dyn DependencyStore>,
}

impl DependencyRegistry {
    /// Create a registry over the given backend
    pub fn new(store: Arc<dyn DependencyStore>) -> Self {
        Self { store }
    }

    /// Validate a store payload and persist the resulting record.
    ///
    /// `repository`, `package_name`, and the dependencies payload must all be
    /// present; otherwise the operation fails with `InvalidPayload` and
    /// nothing is written.
    pub async fn store(
        &self,
        repository: &str,
        package_name: &str,
        dependencies: Option<StorePayload>,
    ) -> RegistryResult<()> {
        let record = build_record(repository, package_name, dependencies)?;
        self.store.put_record(&record).await?;
        info!(
            package = %record.package_name,
            repo = %record.repo_name,
            "stored dependency record"
        );
        Ok(())
    }

    /// Read every record, following pagination transparently
    pub async fn scan_all(&self) -> RegistryResult<Vec<PackageRecord>> {
        self.store.scan_all().await
    }
}

/// Validate the raw store fields and assemble the registry record
fn build_record(
    repository: &str,
    package_name: &str,
    dependencies: Option<StorePayload>,
) -> RegistryResult<PackageRecord> {
    if repository.is_empty() || package_name.is_empty() || dependencies.is_none() {
        return Err(SprigError::invalid_payload(
            "repository, package_name, and dependencies are required fields",
        ));
    }

    let payload = dependencies.unwrap_or_default();
    let mut record = PackageRecord::new(package_name, repository);
    record.dependencies = payload.dependencies;
    record.dev_dependencies = payload.dev_dependencies;
    Ok(record)
}

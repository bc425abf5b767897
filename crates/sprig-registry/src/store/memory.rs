//! In-memory store fake (testing and local runs).
//!
//! Satisfies the `DependencyStore` contract without any external backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use sprig_core::PackageRecord;

use super::DependencyStore;
use crate::RegistryResult;

/// In-memory dependency store backed by a `Mutex<HashMap>`
#[derive(Debug, Default)]
pub struct MemoryDependencyStore {
    records: Mutex<HashMap<String, PackageRecord>>,
}

impl MemoryDependencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DependencyStore for MemoryDependencyStore {
    async fn put_record(&self, record: &PackageRecord) -> RegistryResult<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.package_name.clone(), record.clone());
        Ok(())
    }

    async fn scan_all(&self) -> RegistryResult<Vec<PackageRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.values().cloned().collect())
    }
}

//! HTTP key-value backend.
//!
//! Speaks to a table-addressed record store: full-overwrite `PUT` per key,
//! and a cursor-paged scan that this client follows to exhaustion so callers
//! always see the full record set.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use sprig_core::{PackageRecord, SprigError};

use super::DependencyStore;
use crate::RegistryResult;

/// One page of a table scan
#[derive(Debug, Deserialize)]
struct ScanPage {
    items: Vec<PackageRecord>,
    next_cursor: Option<String>,
}

/// Table-addressed HTTP record store
#[derive(Debug, Clone)]
pub struct HttpDependencyStore {
    client: Client,
    base_url: String,
    table: String,
}

impl HttpDependencyStore {
    /// Create a store client for one table
    pub fn new(base_url: impl Into<String>, table: impl Into<String>) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("sprig/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SprigError::store("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
        })
    }

    fn record_url(&self, key: &str) -> String {
        format!(
            "{}/tables/{}/records/{}",
            self.base_url,
            self.table,
            encode_key(key)
        )
    }

    fn scan_url(&self, cursor: Option<&str>) -> String {
        let base = format!("{}/tables/{}/records", self.base_url, self.table);
        match cursor {
            Some(token) => format!("{}?cursor={}", base, token),
            None => base,
        }
    }
}

/// Encode a record key for use as a URL path segment (scoped package names
/// contain a slash)
fn encode_key(key: &str) -> String {
    key.replace('/', "%2f")
}

#[async_trait]
impl DependencyStore for HttpDependencyStore {
    async fn put_record(&self, record: &PackageRecord) -> RegistryResult<()> {
        let url = self.record_url(&record.package_name);
        let response = self
            .client
            .put(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| SprigError::store("Failed to reach record store", e))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(SprigError::StoreUnavailable {
                message: format!("Record store returned status {} for put", status),
                source: None,
            }),
        }
    }

    async fn scan_all(&self) -> RegistryResult<Vec<PackageRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = self.scan_url(cursor.as_deref());
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| SprigError::store("Failed to reach record store", e))?;

            let page: ScanPage = match response.status() {
                StatusCode::OK => response
                    .json()
                    .await
                    .map_err(|e| SprigError::store("Failed to parse scan page", e))?,
                status => {
                    return Err(SprigError::StoreUnavailable {
                        message: format!("Record store returned status {} for scan", status),
                        source: None,
                    })
                }
            };

            debug!(page_len = page.items.len(), "fetched scan page");
            records.extend(page.items);

            match page.next_cursor {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        Ok(records)
    }
}

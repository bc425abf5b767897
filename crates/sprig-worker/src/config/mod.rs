//! Worker configuration.
//!
//! The registry table identifier and the git owner identity are required;
//! their absence is a configuration error that fails the entire batch,
//! not any single job. Everything else has a sensible default.

use std::time::Duration;

use sprig_core::SprigError;

use crate::WorkerResult;

/// Registry table identifier (required)
pub const ENV_DEPENDENCIES_TABLE: &str = "SPRIG_DEPENDENCIES_TABLE";
/// Owner of every repository the worker writes to (required)
pub const ENV_GIT_OWNER: &str = "SPRIG_GIT_OWNER";
/// Record store endpoint
pub const ENV_STORE_ENDPOINT: &str = "SPRIG_STORE_ENDPOINT";
/// GitHub API endpoint
pub const ENV_GITHUB_API_URL: &str = "SPRIG_GITHUB_API_URL";
/// Installation-scoped GitHub token
pub const ENV_GITHUB_TOKEN: &str = "SPRIG_GITHUB_TOKEN";
/// Manifest-update tool program
pub const ENV_MANIFEST_TOOL: &str = "SPRIG_MANIFEST_TOOL";
/// Manifest-update tool timeout in seconds
pub const ENV_MANIFEST_TIMEOUT_SECS: &str = "SPRIG_MANIFEST_TIMEOUT_SECS";

/// Validated worker configuration, read once per process start
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Registry table holding the package records
    pub dependencies_table: String,
    /// Owner under which bump branches and pull requests are written
    pub git_owner: String,
    /// Record store endpoint
    pub store_endpoint: String,
    /// GitHub API endpoint
    pub github_api_url: String,
    /// Installation-scoped token, when authenticated
    pub github_token: Option<String>,
    /// Program invoked to rewrite manifest pins
    pub manifest_tool: String,
    /// Bound on each manifest-tool invocation
    pub manifest_timeout: Duration,
}

impl WorkerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup.
    ///
    /// Both required values are checked before returning so the error
    /// names every missing key at once.
    pub fn from_lookup<F>(lookup: F) -> WorkerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();

        let dependencies_table = required(&lookup, ENV_DEPENDENCIES_TABLE, &mut missing);
        let git_owner = required(&lookup, ENV_GIT_OWNER, &mut missing);

        if !missing.is_empty() {
            return Err(SprigError::Configuration { missing });
        }

        let manifest_timeout = lookup(ENV_MANIFEST_TIMEOUT_SECS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            dependencies_table: dependencies_table.unwrap_or_default(),
            git_owner: git_owner.unwrap_or_default(),
            store_endpoint: lookup(ENV_STORE_ENDPOINT)
                .unwrap_or_else(|| "http://localhost:8000".to_string()),
            github_api_url: lookup(ENV_GITHUB_API_URL)
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            github_token: lookup(ENV_GITHUB_TOKEN),
            manifest_tool: lookup(ENV_MANIFEST_TOOL).unwrap_or_else(|| "npm".to_string()),
            manifest_timeout,
        })
    }
}

fn required<F>(lookup: &F, key: &str, missing: &mut Vec<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            missing.push(key.to_string());
            None
        }
    }
}

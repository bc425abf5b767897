//! Batch job processor.
//!
//! Each delivered job is parsed, dispatched on its `request_type`, and
//! succeeds or fails on its own; the report names exactly the failed item
//! identifiers so the queue redelivers only those. Jobs inside one batch
//! run concurrently: they share no mutable state, and the only known race
//! (two bumps fast-forwarding the same repository branch) loses loudly as
//! a ref conflict on one side.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info};

use sprig_core::{Job, RawJob, SprigError, Version};
use sprig_github::{
    upsert_pull_request, GithubClient, GithubConfig, GitWriteProtocol, ManifestUpdater,
};
use sprig_registry::{DependencyRegistry, HttpDependencyStore};
use sprig_resolver::find_parents;

use crate::config::WorkerConfig;
use crate::WorkerResult;

#[cfg(test)]
mod tests;

/// Partial-batch-failure report: the item identifiers to redeliver
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub failed: Vec<String>,
}

impl BatchReport {
    /// Report with no failures
    pub fn clean() -> Self {
        Self::default()
    }

    /// Report failing every delivery in the batch (fatal batch-wide error)
    pub fn all_failed(batch: &[RawJob]) -> Self {
        Self {
            failed: batch.iter().map(|job| job.id.clone()).collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Processes job batches against injected collaborators.
///
/// Constructed once per process start and reused across batches; holds no
/// per-job state.
pub struct BatchProcessor {
    config: WorkerConfig,
    registry: DependencyRegistry,
    github: GithubClient,
    updater: ManifestUpdater,
}

impl BatchProcessor {
    /// Assemble a processor from explicit collaborators
    pub fn new(
        config: WorkerConfig,
        registry: DependencyRegistry,
        github: GithubClient,
        updater: ManifestUpdater,
    ) -> Self {
        Self {
            config,
            registry,
            github,
            updater,
        }
    }

    /// Build the production wiring from validated configuration
    pub fn from_config(config: WorkerConfig) -> WorkerResult<Self> {
        let store = HttpDependencyStore::new(&config.store_endpoint, &config.dependencies_table)?;
        let registry = DependencyRegistry::new(Arc::new(store));
        let github = GithubClient::new(GithubConfig {
            base_url: config.github_api_url.clone(),
            token: config.github_token.clone(),
            ..GithubConfig::default()
        })?;
        let updater =
            ManifestUpdater::new(&config.manifest_tool).with_timeout(config.manifest_timeout);
        Ok(Self::new(config, registry, github, updater))
    }

    /// Process every job in the batch, isolating failures per item
    pub async fn process_batch(&self, batch: &[RawJob]) -> BatchReport {
        let outcomes = join_all(batch.iter().map(|raw| self.process_raw(raw))).await;

        let failed = batch
            .iter()
            .zip(outcomes)
            .filter_map(|(raw, outcome)| match outcome {
                Ok(()) => None,
                Err(err) => {
                    error!(job_id = %raw.id, error = %err, "job failed");
                    Some(raw.id.clone())
                }
            })
            .collect();

        BatchReport { failed }
    }

    async fn process_raw(&self, raw: &RawJob) -> WorkerResult<()> {
        let job = Job::parse(&raw.body)?;
        debug!(job_id = %raw.id, "dispatching job");
        self.process_job(job).await
    }

    async fn process_job(&self, job: Job) -> WorkerResult<()> {
        match job {
            Job::StoreDependency {
                repository,
                package_name,
                dependencies,
            } => {
                self.registry
                    .store(&repository, &package_name, dependencies)
                    .await
            }
            Job::BumpParents {
                updated_package_name,
                updated_package_version,
            } => {
                self.bump_parents(&updated_package_name, &updated_package_version)
                    .await
            }
        }
    }

    /// Find every repository pinning an older version and push a bump PR
    /// into each.
    ///
    /// Any parent failure fails this job so the queue redelivers it; the
    /// branch-ensure and PR-upsert steps are idempotent, so parents that
    /// already succeeded are safe to replay.
    async fn bump_parents(&self, package: &str, version_str: &str) -> WorkerResult<()> {
        let version = Version::from_str(version_str)?;
        let records = self.registry.scan_all().await?;
        let parents = find_parents(&records, package, &version);

        if parents.is_empty() {
            info!(package, version = version_str, "no parent dependencies need an update");
            return Ok(());
        }

        let protocol = GitWriteProtocol::new(&self.github, &self.updater);
        let mut first_error: Option<SprigError> = None;

        for parent in parents {
            match self
                .bump_one(&protocol, &parent.repo_name, package, version_str)
                .await
            {
                Ok(url) => {
                    info!(repo = %parent.repo_name, url = %url, "bump pull request ready")
                }
                Err(err) => {
                    error!(repo = %parent.repo_name, error = %err, "bump failed for parent");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    async fn bump_one(
        &self,
        protocol: &GitWriteProtocol<'_>,
        repo: &str,
        package: &str,
        version: &str,
    ) -> WorkerResult<String> {
        let owner = &self.config.git_owner;
        let pushed = protocol.push_bump(owner, repo, package, version).await?;

        let title = format!("Update {} to {}", package, version);
        let body = format!("This PR updates {} to version {}.", package, version);
        upsert_pull_request(
            &self.github,
            owner,
            repo,
            &pushed.branch,
            &pushed.base_branch,
            &title,
            &body,
        )
        .await
    }
}

/// Queue entry point: validate configuration, then process the batch.
///
/// A configuration failure is the one error allowed to escalate past job
/// scope; it fails every delivery in the batch.
pub async fn handle_batch(config: WorkerResult<WorkerConfig>, batch: &[RawJob]) -> BatchReport {
    let processor = match config.and_then(BatchProcessor::from_config) {
        Ok(processor) => processor,
        Err(err) => {
            error!(error = %err, "fatal batch-wide error; failing every delivery");
            return BatchReport::all_failed(batch);
        }
    };
    processor.process_batch(batch).await
}

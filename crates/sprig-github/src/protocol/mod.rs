//! Idempotent git write protocol for one bump.
//!
//! Per target repository the flow is: read the default branch and its tip,
//! resolve the working branch (create it from the default tip when absent),
//! stage the manifests through the external update tool, then write a
//! tree + commit and fast-forward the branch ref. Re-running any prefix of
//! the flow against the same starting state is safe: a branch left over
//! from a failed run resolves as existing and is reused.

use base64::{engine::general_purpose, Engine as _};
use tracing::{debug, info};

use sprig_core::SprigError;

use crate::api::{CreatedObject, NewCommit, NewTree, RefUpdate, TreeItem};
use crate::client::GithubClient;
use crate::staging::{ManifestUpdater, StagingArea};
use crate::GithubResult;


/// Manifest files staged and committed by every bump
pub const MANIFEST_PATHS: [&str; 2] = ["package.json", "package-lock.json"];

/// Working-branch resolution result.
///
/// Absence is data here, not an error: the caller switches on the tag to
/// decide create-vs-reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchState {
    /// Branch ref present, tip commit known
    Exists { sha: String },
    /// Ref must be created from the default branch's tip
    Absent,
}

/// Outcome of a completed protocol run
#[derive(Debug, Clone)]
pub struct PushedBump {
    /// Working branch now containing the bump commit
    pub branch: String,
    /// Default branch the pull request will target
    pub base_branch: String,
    /// Sha of the bump commit
    pub commit_sha: String,
}

/// The git write protocol against one repository
pub struct GitWriteProtocol<'a> {
    client: &'a GithubClient,
    updater: &'a ManifestUpdater,
}

impl<'a> GitWriteProtocol<'a> {
    pub fn new(client: &'a GithubClient, updater: &'a ManifestUpdater) -> Self {
        Self { client, updater }
    }

    /// Working-branch name for a bump.
    ///
    /// Slashes in scoped package names become dashes so the ref stays a
    /// single path segment.
    pub fn branch_name(package: &str, version: &str) -> String {
        format!("update-{}-to-{}", package.replace('/', "-"), version)
    }

    /// Read the working branch, mapping "not found" to `Absent`
    pub async fn resolve_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> GithubResult<BranchState> {
        match self.client.get_branch(owner, repo, branch).await {
            Ok(info) => Ok(BranchState::Exists {
                sha: info.commit.sha,
            }),
            Err(SprigError::NotFound { .. }) => Ok(BranchState::Absent),
            Err(err) => Err(err),
        }
    }

    /// Make sure the working branch exists and return its tip sha.
    ///
    /// A branch left over from a previously failed run resolves as
    /// `Exists` and is reused without error.
    async fn ensure_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        default_tip: &str,
    ) -> GithubResult<String> {
        match self.resolve_branch(owner, repo, branch).await? {
            BranchState::Exists { sha } => {
                debug!(branch, tip = %sha, "reusing existing working branch");
                Ok(sha)
            }
            BranchState::Absent => {
                self.client
                    .create_ref(owner, repo, &format!("refs/heads/{}", branch), default_tip)
                    .await?;
                debug!(branch, tip = default_tip, "created working branch");
                Ok(default_tip.to_string())
            }
        }
    }

    /// Download the manifests at the working branch, run the update tool in
    /// an isolated staging area, and read the results back as tree entries.
    async fn stage_manifests(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        package: &str,
        version: &str,
    ) -> GithubResult<Vec<TreeItem>> {
        let staging = StagingArea::new()?;

        for path in MANIFEST_PATHS {
            let file = self.client.get_content(owner, repo, path, branch).await?;
            let contents = decode_content(&file.encoding, &file.content)?;
            staging.write_file(path, &contents).await?;
        }

        self.updater.update(staging.root(), package, version).await?;

        let mut staged = Vec::with_capacity(MANIFEST_PATHS.len());
        for path in MANIFEST_PATHS {
            let contents = staging.read_file(path).await?;
            staged.push(TreeItem::blob(path, contents));
        }
        Ok(staged)
    }

    /// Write tree + commit on top of `tip_sha` and fast-forward the branch.
    ///
    /// A tip that moved since it was read fails with `RefConflict`; that is
    /// fatal for the job and never retried here.
    async fn commit_staged(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        tip_sha: &str,
        message: &str,
        files: Vec<TreeItem>,
    ) -> GithubResult<String> {
        let tree: CreatedObject = self
            .client
            .create_tree(
                owner,
                repo,
                &NewTree {
                    base_tree: tip_sha.to_string(),
                    tree: files,
                },
            )
            .await?;

        let commit: CreatedObject = self
            .client
            .create_commit(
                owner,
                repo,
                &NewCommit {
                    message: message.to_string(),
                    tree: tree.sha,
                    parents: vec![tip_sha.to_string()],
                },
            )
            .await?;

        let update = RefUpdate {
            sha: commit.sha.clone(),
            force: false,
        };
        match self.client.update_ref(owner, repo, branch, &update).await {
            Ok(()) => Ok(commit.sha),
            Err(SprigError::ApiStatus { status: 422, .. }) => Err(SprigError::RefConflict {
                repo: repo.to_string(),
                branch: branch.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Run the whole protocol: ensure branch, stage, commit, fast-forward.
    ///
    /// Staged content identical to what is already on the branch still
    /// produces a commit; there is deliberately no content-diff
    /// short-circuit.
    pub async fn push_bump(
        &self,
        owner: &str,
        repo: &str,
        package: &str,
        version: &str,
    ) -> GithubResult<PushedBump> {
        let repository = self.client.get_repository(owner, repo).await?;
        let default_tip = self
            .client
            .get_branch(owner, repo, &repository.default_branch)
            .await?
            .commit
            .sha;

        let branch = Self::branch_name(package, version);
        let tip = self.ensure_branch(owner, repo, &branch, &default_tip).await?;

        let staged = self
            .stage_manifests(owner, repo, &branch, package, version)
            .await?;

        let message = format!("update {} to {}", package, version);
        let commit_sha = self
            .commit_staged(owner, repo, &branch, &tip, &message, staged)
            .await?;

        info!(repo, branch, commit = %commit_sha, "pushed bump commit");
        Ok(PushedBump {
            branch,
            base_branch: repository.default_branch,
            commit_sha,
        })
    }
}

/// Decode file content from its transport encoding
fn decode_content(encoding: &str, content: &str) -> GithubResult<Vec<u8>> {
    if encoding != "base64" {
        return Err(SprigError::ApiStatus {
            status: 500,
            message: format!("Unexpected content encoding '{}'", encoding),
        });
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SprigError::ApiStatus {
            status: 500,
            message: format!("Invalid base64 content: {}", e),
        })
}

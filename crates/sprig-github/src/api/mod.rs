//! GitHub REST API request/response types

use serde::{Deserialize, Serialize};

/// Git file mode for regular (non-executable) blobs
pub const FILE_MODE_BLOB: &str = "100644";

/// Tree entry type for file content
pub const TREE_TYPE_BLOB: &str = "blob";

/// Repository metadata (the slice we consume)
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    /// Name of the default branch (bump PRs target it)
    pub default_branch: String,
}

/// Branch metadata with its tip commit
#[derive(Debug, Clone, Deserialize)]
pub struct BranchInfo {
    /// Branch name
    pub name: String,
    /// Tip commit
    pub commit: CommitRef,
}

/// Reference to a commit by sha
#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// File content response (base64 transport encoding)
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    /// File name within its directory
    pub name: String,
    /// Base64-encoded content, possibly with embedded newlines
    pub content: String,
    /// Transport encoding; "base64" for blobs we consume
    pub encoding: String,
}

/// Request body for creating a git ref
#[derive(Debug, Clone, Serialize)]
pub struct NewRef {
    /// Fully qualified ref name ("refs/heads/...")
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Commit the ref should point at
    pub sha: String,
}

/// One entry in a tree creation request
#[derive(Debug, Clone, Serialize)]
pub struct TreeItem {
    /// Path relative to the repository root
    pub path: String,
    /// File mode; always a regular-file blob here
    pub mode: String,
    /// Entry type
    #[serde(rename = "type")]
    pub item_type: String,
    /// Inline file content
    pub content: String,
}

impl TreeItem {
    /// A regular-file blob entry with inline content
    pub fn blob(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FILE_MODE_BLOB.to_string(),
            item_type: TREE_TYPE_BLOB.to_string(),
            content: content.into(),
        }
    }
}

/// Request body for creating a tree
#[derive(Debug, Clone, Serialize)]
pub struct NewTree {
    /// Tree of the commit this one is based on
    pub base_tree: String,
    pub tree: Vec<TreeItem>,
}

/// Request body for creating a commit object
#[derive(Debug, Clone, Serialize)]
pub struct NewCommit {
    pub message: String,
    pub tree: String,
    /// Sole parent: the branch tip observed at staging time
    pub parents: Vec<String>,
}

/// Response carrying the sha of a created git object
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedObject {
    pub sha: String,
}

/// Request body for a ref update
#[derive(Debug, Clone, Serialize)]
pub struct RefUpdate {
    pub sha: String,
    /// Always false: fast-forward only, a moved tip must fail loudly
    pub force: bool,
}

/// Pull request (the slice we consume)
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub body: Option<String>,
}

/// Request body for opening a pull request
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

/// Request body for updating a pull request
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestUpdate {
    pub body: String,
}

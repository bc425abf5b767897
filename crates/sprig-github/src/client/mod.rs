//! HTTP client for the GitHub REST API with bounded rate-limit retry.
//!
//! The client is constructed once per process and injected into everything
//! that talks to GitHub. Responses are classified here into tagged error
//! kinds; nothing downstream inspects raw statuses or error shapes.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use sprig_core::SprigError;

use crate::api::{
    BranchInfo, ContentFile, CreatedObject, NewCommit, NewPullRequest, NewRef, NewTree,
    PullRequest, PullRequestUpdate, RefUpdate, RepositoryInfo,
};
use crate::GithubResult;


/// Configuration for rate-limit backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after a primary rate-limit signal
    pub primary_retries: u32,
    /// Retries after a secondary (abuse-detection) signal
    pub secondary_retries: u32,
    /// Hint used when the response carries no retry-after header
    pub fallback_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            primary_retries: 2,
            secondary_retries: 1,
            fallback_retry_after: Duration::from_secs(1),
        }
    }
}

/// Connection configuration for the API client
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API endpoint; overridable for tests
    pub base_url: String,
    /// Installation-scoped token, when authenticated
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A rate-limit signal classified out of a response
#[derive(Debug, Clone, Copy)]
struct RateLimitSignal {
    retry_after: Option<Duration>,
    secondary: bool,
}

/// GitHub REST client shared across all jobs in a process
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
    retry: RetryConfig,
}

impl GithubClient {
    /// Create a client from connection configuration
    pub fn new(config: GithubConfig) -> GithubResult<Self> {
        Self::with_retry(config, RetryConfig::default())
    }

    /// Create a client with custom retry bounds
    pub fn with_retry(config: GithubConfig, retry: RetryConfig) -> GithubResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &config.token {
            let value = format!("Bearer {}", token)
                .parse()
                .map_err(|e| SprigError::network("Invalid auth token", e))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .gzip(true)
            .default_headers(headers)
            .user_agent(concat!("sprig/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SprigError::network("Failed to create HTTP client", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Send a request, retrying on rate-limit signals within the configured
    /// bounds. Exceeding a bound surfaces the rate-limit error; every other
    /// failure surfaces immediately.
    async fn send_with_retry<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GithubResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0u32;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request
                .send()
                .await
                .map_err(|e| SprigError::network(format!("Request to {} failed", path), e))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(SprigError::NotFound {
                    resource: path.to_string(),
                });
            }

            let headers = response.headers().clone();
            let message = response.text().await.unwrap_or_default();

            let Some(signal) = classify_rate_limit(status, &headers, &message) else {
                return Err(SprigError::ApiStatus {
                    status: status.as_u16(),
                    message: truncate_message(&message),
                });
            };

            let bound = if signal.secondary {
                self.retry.secondary_retries
            } else {
                self.retry.primary_retries
            };
            if retries >= bound {
                return Err(SprigError::RateLimited {
                    attempts: retries + 1,
                });
            }

            let hint = signal.retry_after.unwrap_or(self.retry.fallback_retry_after);
            let delay = backoff_delay(hint, retries);
            warn!(
                path,
                status = status.as_u16(),
                secondary = signal.secondary,
                delay_ms = delay.as_millis() as u64,
                "rate limited, backing off"
            );
            tokio::time::sleep(delay).await;
            retries += 1;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GithubResult<T> {
        let response = self.send_with_retry::<()>(Method::GET, path, None).await?;
        decode(path, response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> GithubResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_with_retry(method, path, Some(body)).await?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> GithubResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| SprigError::network(format!("Failed to parse response from {}", path), e))
}

impl GithubClient {
    /// Repository metadata (default branch name)
    pub async fn get_repository(&self, owner: &str, repo: &str) -> GithubResult<RepositoryInfo> {
        self.get_json(&format!("/repos/{}/{}", owner, repo)).await
    }

    /// Branch metadata with its tip commit
    pub async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> GithubResult<BranchInfo> {
        self.get_json(&format!("/repos/{}/{}/branches/{}", owner, repo, branch))
            .await
    }

    /// Create a ref pointing at `sha`
    pub async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        ref_name: &str,
        sha: &str,
    ) -> GithubResult<()> {
        let body = NewRef {
            ref_name: ref_name.to_string(),
            sha: sha.to_string(),
        };
        self.send_with_retry(
            Method::POST,
            &format!("/repos/{}/{}/git/refs", owner, repo),
            Some(&body),
        )
        .await
        .map(|_| ())
    }

    /// File content at a path and ref
    pub async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> GithubResult<ContentFile> {
        self.get_json(&format!(
            "/repos/{}/{}/contents/{}?ref={}",
            owner, repo, path, git_ref
        ))
        .await
    }

    /// Create a tree object
    pub async fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        tree: &NewTree,
    ) -> GithubResult<CreatedObject> {
        self.send_json(
            Method::POST,
            &format!("/repos/{}/{}/git/trees", owner, repo),
            tree,
        )
        .await
    }

    /// Create a commit object
    pub async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        commit: &NewCommit,
    ) -> GithubResult<CreatedObject> {
        self.send_json(
            Method::POST,
            &format!("/repos/{}/{}/git/commits", owner, repo),
            commit,
        )
        .await
    }

    /// Update a branch ref. The update payload always carries `force: false`;
    /// a tip that moved since it was read fails with a 422 the caller maps
    /// to `RefConflict`.
    pub async fn update_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        update: &RefUpdate,
    ) -> GithubResult<()> {
        self.send_with_retry(
            Method::PATCH,
            &format!("/repos/{}/{}/git/refs/heads/{}", owner, repo, branch),
            Some(update),
        )
        .await
        .map(|_| ())
    }

    /// Open pull requests for a head/base pair
    pub async fn list_open_pulls(
        &self,
        owner: &str,
        repo: &str,
        head_branch: &str,
        base: &str,
    ) -> GithubResult<Vec<PullRequest>> {
        self.get_json(&format!(
            "/repos/{}/{}/pulls?state=open&head={}:{}&base={}",
            owner, repo, owner, head_branch, base
        ))
        .await
    }

    /// Open a new pull request
    pub async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> GithubResult<PullRequest> {
        self.send_json(Method::POST, &format!("/repos/{}/{}/pulls", owner, repo), pull)
            .await
    }

    /// Update an existing pull request
    pub async fn update_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &PullRequestUpdate,
    ) -> GithubResult<PullRequest> {
        self.send_json(
            Method::PATCH,
            &format!("/repos/{}/{}/pulls/{}", owner, repo, number),
            update,
        )
        .await
    }
}

/// Classify a non-success response into a rate-limit signal, if it is one.
///
/// Primary: 429, or 403 with an exhausted quota header or retry-after hint.
/// Secondary: the abuse-detection responses GitHub describes in the body.
fn classify_rate_limit(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> Option<RateLimitSignal> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let retry_after = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let lowered = body.to_ascii_lowercase();
    if lowered.contains("secondary rate limit") || lowered.contains("abuse") {
        return Some(RateLimitSignal {
            retry_after,
            secondary: true,
        });
    }

    let quota_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    if quota_exhausted || retry_after.is_some() || status == StatusCode::TOO_MANY_REQUESTS {
        return Some(RateLimitSignal {
            retry_after,
            secondary: false,
        });
    }
    None
}

/// Exponential backoff over the server's hint, plus jitter so simultaneous
/// workers do not retry in lockstep
fn backoff_delay(hint: Duration, attempt: u32) -> Duration {
    let exponent = 2u32.saturating_pow(attempt.min(6));
    hint * exponent + Duration::from_millis(fastrand::u64(0..250))
}

fn truncate_message(message: &str) -> String {
    const LIMIT: usize = 200;
    if message.chars().count() <= LIMIT {
        message.to_string()
    } else {
        let head: String = message.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}

//! Pull-request upsert.
//!
//! The idempotency key is the working branch: at most one open PR per
//! head/base pair is treated as canonical (the first match). Re-running a
//! bump appends its body text to the existing PR rather than opening a
//! duplicate.

use tracing::info;

use crate::api::{NewPullRequest, PullRequestUpdate};
use crate::client::GithubClient;
use crate::GithubResult;

/// Find-or-create the bump pull request and return its URL.
///
/// When a PR already exists its body becomes `old + "\n" + new`. Repeated
/// runs therefore accumulate duplicate lines; that matches the upstream
/// behavior this replaces and is deliberately not deduplicated.
pub async fn upsert_pull_request(
    client: &GithubClient,
    owner: &str,
    repo: &str,
    branch: &str,
    base: &str,
    title: &str,
    body: &str,
) -> GithubResult<String> {
    let existing = client.list_open_pulls(owner, repo, branch, base).await?;

    let Some(canonical) = existing.into_iter().next() else {
        let created = client
            .create_pull(
                owner,
                repo,
                &NewPullRequest {
                    title: title.to_string(),
                    head: branch.to_string(),
                    base: base.to_string(),
                    body: body.to_string(),
                },
            )
            .await?;
        info!(repo, branch, url = %created.html_url, "opened bump pull request");
        return Ok(created.html_url);
    };

    let merged_body = match &canonical.body {
        Some(old) => format!("{}\n{}", old, body),
        None => body.to_string(),
    };
    client
        .update_pull(
            owner,
            repo,
            canonical.number,
            &PullRequestUpdate { body: merged_body },
        )
        .await?;
    info!(repo, branch, url = %canonical.html_url, "updated existing bump pull request");
    Ok(canonical.html_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::GithubConfig;

    fn client_for(server: &MockServer) -> GithubClient {
        GithubClient::new(GithubConfig {
            base_url: server.uri(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_creates_when_no_open_pr() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls"))
            .and(query_param("state", "open"))
            .and(query_param("head", "acme:update-lib-to-1.2.0"))
            .and(query_param("base", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .and(body_partial_json(serde_json::json!({
                "title": "Update lib to 1.2.0",
                "head": "update-lib-to-1.2.0",
                "base": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "number": 7,
                "html_url": "https://github.com/acme/widgets/pull/7",
                "body": "This PR updates lib to version 1.2.0."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = upsert_pull_request(
            &client,
            "acme",
            "widgets",
            "update-lib-to-1.2.0",
            "main",
            "Update lib to 1.2.0",
            "This PR updates lib to version 1.2.0.",
        )
        .await
        .unwrap();

        assert_eq!(url, "https://github.com/acme/widgets/pull/7");
    }

    #[tokio::test]
    async fn test_upsert_appends_body_to_existing_pr() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "number": 7,
                    "html_url": "https://github.com/acme/widgets/pull/7",
                    "body": "This PR updates lib to version 1.1.0."
                }
            ])))
            .mount(&server)
            .await;
        // Body is appended below the existing text, duplicates and all
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .and(body_partial_json(serde_json::json!({
                "body": "This PR updates lib to version 1.1.0.\nThis PR updates lib to version 1.2.0."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 7,
                "html_url": "https://github.com/acme/widgets/pull/7",
                "body": "updated"
            })))
            .expect(1)
            .mount(&server)
            .await;
        // No new PR may be opened
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = upsert_pull_request(
            &client,
            "acme",
            "widgets",
            "update-lib-to-1.2.0",
            "main",
            "Update lib to 1.2.0",
            "This PR updates lib to version 1.2.0.",
        )
        .await
        .unwrap();

        assert_eq!(url, "https://github.com/acme/widgets/pull/7");
    }

    #[tokio::test]
    async fn test_upsert_treats_first_match_as_canonical() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"number": 3, "html_url": "https://github.com/acme/widgets/pull/3", "body": null},
                {"number": 9, "html_url": "https://github.com/acme/widgets/pull/9", "body": "other"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/widgets/pulls/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 3,
                "html_url": "https://github.com/acme/widgets/pull/3",
                "body": "new"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = upsert_pull_request(
            &client,
            "acme",
            "widgets",
            "update-lib-to-1.2.0",
            "main",
            "Update lib to 1.2.0",
            "new",
        )
        .await
        .unwrap();

        assert_eq!(url, "https://github.com/acme/widgets/pull/3");
    }
}

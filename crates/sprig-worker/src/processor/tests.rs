//! Unit tests for the batch processor

use super::*;

use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sprig_core::PackageRecord;
use sprig_registry::{DependencyStore, MemoryDependencyStore};

fn test_config(github_url: String) -> WorkerConfig {
    WorkerConfig {
        dependencies_table: "deps".to_string(),
        git_owner: "acme".to_string(),
        store_endpoint: "http://localhost:0".to_string(),
        github_api_url: github_url,
        github_token: None,
        manifest_tool: "true".to_string(),
        manifest_timeout: Duration::from_secs(5),
    }
}

fn processor_with(server: &MockServer, store: Arc<MemoryDependencyStore>) -> BatchProcessor {
    let config = test_config(server.uri());
    let registry = DependencyRegistry::new(store);
    let github = GithubClient::new(GithubConfig {
        base_url: server.uri(),
        token: None,
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let updater = ManifestUpdater::new("true");
    BatchProcessor::new(config, registry, github, updater)
}

fn raw(id: &str, body: &str) -> RawJob {
    RawJob {
        id: id.to_string(),
        body: body.to_string(),
    }
}

fn store_job_body(repository: &str, package_name: &str) -> String {
    serde_json::json!({
        "request_type": "store_dependency",
        "repository": repository,
        "package_name": package_name,
        "dependencies": {
            "dependencies": {"@acme/lib": "1.0.0"}
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());
    let processor = processor_with(&server, store.clone());

    let batch = vec![
        raw("job-1", &store_job_body("widgets", "@acme/widgets")),
        raw("job-2", "{definitely not json"),
        raw("job-3", &store_job_body("gadgets", "@acme/gadgets")),
    ];

    let report = processor.process_batch(&batch).await;

    assert_eq!(report.failed, vec!["job-2".to_string()]);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_unknown_request_type_fails_only_that_item() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());
    let processor = processor_with(&server, store);

    let batch = vec![
        raw("job-1", &store_job_body("widgets", "@acme/widgets")),
        raw("job-2", r#"{"request_type": "resync_everything"}"#),
    ];

    let report = processor.process_batch(&batch).await;
    assert_eq!(report.failed, vec!["job-2".to_string()]);
}

#[tokio::test]
async fn test_invalid_store_payload_fails_item_and_writes_nothing() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());
    let processor = processor_with(&server, store.clone());

    let body = serde_json::json!({
        "request_type": "store_dependency",
        "repository": "",
        "package_name": "@acme/widgets",
        "dependencies": {"dependencies": {}}
    })
    .to_string();

    let report = processor.process_batch(&[raw("job-1", &body)]).await;

    assert_eq!(report.failed, vec!["job-1".to_string()]);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_missing_configuration_fails_every_job() {
    let batch = vec![
        raw("job-1", &store_job_body("widgets", "@acme/widgets")),
        raw("job-2", "{broken"),
        raw("job-3", &store_job_body("gadgets", "@acme/gadgets")),
    ];

    let config = WorkerConfig::from_lookup(|_| None);
    let report = handle_batch(config, &batch).await;

    assert_eq!(
        report.failed,
        vec![
            "job-1".to_string(),
            "job-2".to_string(),
            "job-3".to_string()
        ]
    );
}

#[tokio::test]
async fn test_bump_job_with_no_parents_succeeds() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());

    // Pin is already newer than the published version
    let mut record = PackageRecord::new("@acme/app", "app");
    record
        .dependencies
        .insert("@acme/lib".to_string(), "2.0.0".to_string());
    store.put_record(&record).await.unwrap();

    let processor = processor_with(&server, store);
    let body = serde_json::json!({
        "request_type": "bump_parents",
        "updated_package_name": "@acme/lib",
        "updated_package_version": "1.5.0"
    })
    .to_string();

    let report = processor.process_batch(&[raw("job-1", &body)]).await;
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_invalid_version_fails_bump_job() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());
    let processor = processor_with(&server, store);

    let body = serde_json::json!({
        "request_type": "bump_parents",
        "updated_package_name": "@acme/lib",
        "updated_package_version": "not-a-version"
    })
    .to_string();

    let report = processor.process_batch(&[raw("job-1", &body)]).await;
    assert_eq!(report.failed, vec!["job-1".to_string()]);
}

#[tokio::test]
async fn test_parent_failure_fails_the_bump_job() {
    // No GitHub routes are mocked, so the first protocol call fails
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());

    let mut record = PackageRecord::new("@acme/app", "widgets");
    record
        .dependencies
        .insert("@acme/lib".to_string(), "1.0.0".to_string());
    store.put_record(&record).await.unwrap();

    let processor = processor_with(&server, store);
    let body = serde_json::json!({
        "request_type": "bump_parents",
        "updated_package_name": "@acme/lib",
        "updated_package_version": "1.2.0"
    })
    .to_string();

    let report = processor.process_batch(&[raw("job-1", &body)]).await;
    assert_eq!(report.failed, vec!["job-1".to_string()]);
}

#[tokio::test]
async fn test_bump_job_end_to_end() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryDependencyStore::new());

    let mut record = PackageRecord::new("@acme/app", "widgets");
    record
        .dependencies
        .insert("@acme/lib".to_string(), "1.0.0".to_string());
    store.put_record(&record).await.unwrap();

    let branch = "update-@acme-lib-to-1.2.0";

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"default_branch": "main"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/branches/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "main",
            "commit": {"sha": "base000"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/widgets/branches/{}", branch)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/git/refs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/package.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "package.json",
            "content": "eyJkZXBlbmRlbmNpZXMiOiB7IkBhY21lL2xpYiI6ICIxLjAuMCJ9fQ==",
            "encoding": "base64"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/package-lock.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "package-lock.json",
            "content": "eyJsb2NrZmlsZVZlcnNpb24iOiAzfQ==",
            "encoding": "base64"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/git/trees"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"sha": "tree111"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/git/commits"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"sha": "commit222"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!(
            "/repos/acme/widgets/git/refs/heads/{}",
            branch
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(body_partial_json(serde_json::json!({
            "title": "Update @acme/lib to 1.2.0",
            "head": branch,
            "base": "main"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 1,
            "html_url": "https://github.com/acme/widgets/pull/1",
            "body": "This PR updates @acme/lib to version 1.2.0."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let processor = processor_with(&server, store);
    let body = serde_json::json!({
        "request_type": "bump_parents",
        "updated_package_name": "@acme/lib",
        "updated_package_version": "1.2.0"
    })
    .to_string();

    let report = processor.process_batch(&[raw("job-1", &body)]).await;
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failed);
}

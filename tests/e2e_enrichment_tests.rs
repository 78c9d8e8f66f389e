//! E2e tests for the enrichment pipeline driven through the admin API.

mod common;

use common::server::{
    LlmBehavior, RepoBehavior, TestOptions, TestServer, STUB_NEW_CATEGORY, STUB_SUMMARY,
};
use common::wait_for;
use serde_json::{json, Value};
use std::time::Duration;

const ENRICH_TIMEOUT: Duration = Duration::from_secs(5);

async fn fetch_detail(server: &TestServer, slug: &str) -> Option<Value> {
    let response = server.get(&format!("/api/servers/{}", slug)).await;
    if !response.status().is_success() {
        return None;
    }
    response.json().await.ok()
}

/// Wait until the entry exists and its enrichment has moved past the
/// placeholder-and-no-categories state.
async fn wait_for_enriched(server: &TestServer, slug: &str) -> Value {
    wait_for(ENRICH_TIMEOUT, || async {
        let detail = fetch_detail(server, slug).await?;
        let has_categories = detail["categories"]
            .as_array()
            .map(|c| !c.is_empty())
            .unwrap_or(false);
        if has_categories {
            Some(detail)
        } else {
            None
        }
    })
    .await
    .expect("entry was not enriched in time")
}

#[tokio::test]
async fn admin_create_runs_the_full_pipeline() {
    let server = TestServer::spawn().await;

    let response = server
        .admin_post(
            "/api/admin/servers",
            &json!({
                "name": "Test Server",
                "homepage_url": "https://example.com/test",
                "repo_url": "https://github.com/acme/test"
            }),
        )
        .await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let detail = wait_for_enriched(&server, "test-server").await;
    assert_eq!(detail["name"], "Test Server");
    assert_eq!(detail["short_desc"], STUB_SUMMARY);
    assert_eq!(detail["stars"], 42);
    assert_eq!(detail["license"], "mit");
    assert_eq!(detail["categories"][0]["name"], STUB_NEW_CATEGORY);

    // The event run was recorded as completed.
    let response = server.admin_get("/api/admin/events").await;
    let runs: Value = response.json().await.unwrap();
    assert_eq!(runs[0]["event"], "server/created");
    assert_eq!(runs[0]["status"], "completed");
}

#[tokio::test]
async fn homepage_pointing_at_github_is_used_as_repo_target() {
    let server = TestServer::spawn().await;

    server
        .admin_post(
            "/api/admin/servers",
            &json!({
                "name": "Test Server",
                "homepage_url": "https://github.com/acme/test"
            }),
        )
        .await;

    wait_for_enriched(&server, "test-server").await;

    let requested = server.requested_repos.lock().unwrap().clone();
    assert_eq!(requested, vec!["acme/test".to_string()]);
}

#[tokio::test]
async fn categorization_failure_still_completes_with_fallback() {
    let server = TestServer::spawn_with(TestOptions {
        llm: LlmBehavior::CategorizeFails,
        ..Default::default()
    })
    .await;

    server
        .admin_post(
            "/api/admin/servers",
            &json!({
                "name": "Fallback Server",
                "homepage_url": "https://example.com/fallback"
            }),
        )
        .await;

    let detail = wait_for_enriched(&server, "fallback-server").await;
    assert_eq!(detail["categories"][0]["name"], "Miscellaneous");
    // Summary still succeeded.
    assert_eq!(detail["short_desc"], STUB_SUMMARY);

    let response = server.admin_get("/api/admin/events").await;
    let runs: Value = response.json().await.unwrap();
    assert_eq!(runs[0]["status"], "completed");
}

#[tokio::test]
async fn collaborator_outage_degrades_but_completes() {
    let server = TestServer::spawn_with(TestOptions {
        llm: LlmBehavior::AllFail,
        repo: RepoBehavior::Fail,
        ..Default::default()
    })
    .await;

    server
        .admin_post(
            "/api/admin/servers",
            &json!({
                "name": "Degraded Server",
                "homepage_url": "https://github.com/acme/degraded"
            }),
        )
        .await;

    let detail = wait_for_enriched(&server, "degraded-server").await;
    assert_eq!(detail["short_desc"], "Processing...");
    assert_eq!(detail["stars"], 0);
    assert_eq!(detail["categories"][0]["name"], "Miscellaneous");
}

#[tokio::test]
async fn redispatched_event_does_not_duplicate_the_entry() {
    let server = TestServer::spawn().await;
    let payload = json!({
        "name": "Test Server",
        "homepage_url": "https://example.com/test"
    });

    server.admin_post("/api/admin/servers", &payload).await;
    wait_for_enriched(&server, "test-server").await;
    server.admin_post("/api/admin/servers", &payload).await;

    // Wait for the second run to finish.
    wait_for(ENRICH_TIMEOUT, || async {
        let response = server.admin_get("/api/admin/events").await;
        let runs: Value = response.json().await.ok()?;
        (runs.as_array()?.len() == 2).then_some(())
    })
    .await
    .expect("second event run not recorded");

    let body = server.get_json("/api/servers").await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn approving_a_submission_creates_the_entry() {
    let server = TestServer::spawn().await;

    let response = server
        .post_json(
            "/api/submissions",
            &json!({
                "name": "Ada",
                "email": "ada@example.com",
                "server_name": "Submitted Server",
                "repo_url": "https://github.com/acme/submitted",
                "description": "From the community"
            }),
        )
        .await;
    let body: Value = response.json().await.unwrap();
    let submission_id = body["submission"]["id"].as_str().unwrap().to_string();

    let response = server
        .admin_post(
            &format!("/api/admin/submissions/{}/approve", submission_id),
            &json!({}),
        )
        .await;
    assert!(response.status().is_success());

    let detail = wait_for_enriched(&server, "submitted-server").await;
    assert_eq!(detail["name"], "Submitted Server");
    assert_eq!(detail["stars"], 42);

    // Submission is marked approved.
    let response = server.admin_get("/api/admin/submissions?status=approved").await;
    let listed: Value = response.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], submission_id.as_str());
}

#[tokio::test]
async fn enriched_entry_appears_in_listing_without_manual_purge() {
    let server = TestServer::spawn().await;

    // Prime the cache with an empty listing.
    let body = server.get_json("/api/servers").await;
    assert_eq!(body["pagination"]["total"], 0);

    server
        .admin_post(
            "/api/admin/servers",
            &json!({
                "name": "Visible Server",
                "homepage_url": "https://example.com/visible"
            }),
        )
        .await;

    wait_for_enriched(&server, "visible-server").await;

    // The workflow purged the listing cache as it wrote.
    let body = server.get_json("/api/servers").await;
    assert_eq!(body["pagination"]["total"], 1);
}

//! Test server lifecycle management.

use super::TEST_ADMIN_TOKEN;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use mcp_directory_server::directory_store::{DirectoryStore, SqliteDirectoryStore};
use mcp_directory_server::dispatch::{DispatcherConfig, EventDispatcher, EventHandler};
use mcp_directory_server::enrichment::{EnrichmentWorkflow, RepoHost, RepoRef, RepoStats};
use mcp_directory_server::listing::ListingCache;
use mcp_directory_server::llm::{LlmError, LlmProvider, ObjectRequest, ObjectResponse};
use mcp_directory_server::server::state::ServerState;
use mcp_directory_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// What the stubbed LLM does for each call family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmBehavior {
    /// Summary and categorization both succeed.
    Happy,
    /// Summary succeeds, categorization call errors.
    CategorizeFails,
    /// Every call errors.
    AllFail,
}

/// What the stubbed repository host does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepoBehavior {
    /// Return fixed stats with this star count.
    Stats(i64),
    /// Every fetch errors.
    Fail,
}

pub struct TestOptions {
    pub admin_token: Option<String>,
    pub submissions_per_hour: u32,
    pub llm: LlmBehavior,
    pub repo: RepoBehavior,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
            submissions_per_hour: 10,
            llm: LlmBehavior::Happy,
            repo: RepoBehavior::Stats(42),
        }
    }
}

pub const STUB_SUMMARY: &str = "Provides weather data for integration tests";
pub const STUB_NEW_CATEGORY: &str = "Testing Tools";

struct StubRepoHost {
    behavior: RepoBehavior,
    requested: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RepoHost for StubRepoHost {
    async fn fetch_stats(&self, repo: &RepoRef) -> anyhow::Result<RepoStats> {
        self.requested.lock().unwrap().push(repo.to_string());
        match self.behavior {
            RepoBehavior::Fail => Err(anyhow!("stubbed outage")),
            RepoBehavior::Stats(stars) => Ok(RepoStats {
                stars,
                forks: 3,
                last_push: Some(Utc::now()),
                license_key: Some("mit".to_string()),
                license_name: Some("MIT License".to_string()),
            }),
        }
    }

    async fn fetch_readme(&self, _repo: &RepoRef) -> anyhow::Result<Option<String>> {
        match self.behavior {
            RepoBehavior::Fail => Err(anyhow!("stubbed outage")),
            RepoBehavior::Stats(_) => Ok(Some("# Stub readme".to_string())),
        }
    }
}

struct StubLlm {
    behavior: LlmBehavior,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    async fn generate_object(&self, request: &ObjectRequest) -> Result<ObjectResponse, LlmError> {
        let fail = Err(LlmError::Api {
            status: 500,
            message: "stubbed outage".to_string(),
        });
        match (request.schema_name.as_str(), self.behavior) {
            (_, LlmBehavior::AllFail) => fail,
            ("CategorizeServerResponse", LlmBehavior::CategorizeFails) => fail,
            ("GenerateContentResponse", _) => Ok(ObjectResponse {
                object: json!({ "summary": STUB_SUMMARY }),
                usage: None,
            }),
            ("CategorizeServerResponse", _) => Ok(ObjectResponse {
                object: json!({
                    "categories": [],
                    "categoriesToAdd": [STUB_NEW_CATEGORY]
                }),
                usage: None,
            }),
            (other, _) => panic!("unexpected schema {}", other),
        }
    }
}

/// A running server instance with its collaborators stubbed out.
///
/// Dropping it cancels the server and dispatcher tasks and removes the
/// temp database.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<SqliteDirectoryStore>,
    pub client: reqwest::Client,
    /// owner/name strings the stub repo host was asked about.
    pub requested_repos: Arc<Mutex<Vec<String>>>,

    _temp_dir: TempDir,
    shutdown: CancellationToken,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteDirectoryStore::new(temp_dir.path().join("directory.db"))
                .expect("Failed to open store"),
        );
        let cache = Arc::new(ListingCache::default());

        let requested_repos = Arc::new(Mutex::new(Vec::new()));
        let repo_host = Arc::new(StubRepoHost {
            behavior: options.repo,
            requested: requested_repos.clone(),
        });
        let llm = Arc::new(StubLlm {
            behavior: options.llm,
        });

        let guarded_store: Arc<dyn DirectoryStore> = store.clone();
        let workflow: Arc<dyn EventHandler> = Arc::new(
            EnrichmentWorkflow::new(guarded_store.clone(), repo_host, llm)
                .with_cache(cache.clone()),
        );

        let shutdown = CancellationToken::new();
        let (dispatcher, dispatcher_handle) = EventDispatcher::new(
            DispatcherConfig {
                max_attempts: 2,
                retry_delay: Duration::from_millis(50),
            },
            guarded_store.clone(),
            vec![workflow],
            shutdown.clone(),
        );
        tokio::spawn(dispatcher.run());

        let state = ServerState {
            config: ServerConfig {
                requests_logging_level: RequestsLoggingLevel::None,
                admin_token: options.admin_token,
                submissions_per_hour: options.submissions_per_hour,
            },
            start_time: Instant::now(),
            store: guarded_store,
            cache,
            dispatcher: dispatcher_handle,
            hash: "test".to_string(),
        };

        let app = make_app(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().expect("No local addr").port();

        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
            .expect("Test server crashed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
            requested_repos,
            _temp_dir: temp_dir,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert!(
            response.status().is_success(),
            "GET {} returned {}",
            path,
            response.status()
        );
        response.json().await.expect("Invalid JSON response")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn admin_post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(TEST_ADMIN_TOKEN)
            .json(body)
            .send()
            .await
            .expect("admin POST failed")
    }

    pub async fn admin_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(TEST_ADMIN_TOKEN)
            .send()
            .await
            .expect("admin GET failed")
    }

    pub async fn admin_put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(TEST_ADMIN_TOKEN)
            .json(body)
            .send()
            .await
            .expect("admin PUT failed")
    }

    pub async fn admin_delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(TEST_ADMIN_TOKEN)
            .send()
            .await
            .expect("admin DELETE failed")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

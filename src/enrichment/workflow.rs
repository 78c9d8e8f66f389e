//! The enrichment workflow: create an entry, then fill it in from the
//! repository host and the LLM, persisting after every step.
//!
//! Only the create step can fail the workflow. Stats, summary, and
//! categorization all degrade to safe defaults: a missing collaborator
//! leaves the entry with zero stats, the placeholder description, or the
//! fallback category, and the workflow still completes.

use super::github::{parse_repo_url, RepoHost};
use super::prompts::{
    categorize_schema, clamp_summary, render_template, summary_schema, Categorization,
    GeneratedSummary, CATEGORIZE_SYSTEM_PROMPT, CATEGORIZE_TEMPLATE, SUMMARY_SYSTEM_PROMPT,
    SUMMARY_TEMPLATE,
};
use crate::directory_store::{DirectoryStore, Entry, NewEntry, RepoStatsPatch};
use crate::dispatch::{EventHandler, HandlerError};
use crate::listing::{ListingCache, SERVERS_TAG};
use crate::llm::{LlmProvider, ObjectRequest};
use crate::slug::unique_slug;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const SERVER_CREATED_EVENT: &str = "server/created";

/// Catch-all category when classification produces nothing.
pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

/// Short description an entry carries until the summary step replaces it.
pub const PLACEHOLDER_SHORT_DESC: &str = "Processing...";

/// Payload of the `server/created` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub homepage_url: String,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub ai_context: Option<String>,
    #[serde(default)]
    pub submission_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("missing required fields: name and homepage_url")]
    MissingFields,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Repo numbers carried through the report even when nothing was fetched.
#[derive(Debug, Clone, Serialize)]
pub struct RepoStatsSummary {
    pub stars: i64,
    pub forks: i64,
    pub last_commit: Option<DateTime<Utc>>,
    pub license: String,
}

impl Default for RepoStatsSummary {
    fn default() -> Self {
        Self {
            stars: 0,
            forks: 0,
            last_commit: None,
            license: "unknown".to_string(),
        }
    }
}

/// Aggregated step outputs, returned for observability.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub entry_id: String,
    pub slug: String,
    pub name: String,
    pub short_desc: String,
    pub long_desc: Option<String>,
    pub stats: RepoStatsSummary,
    pub categories: Vec<String>,
    pub processing_complete: bool,
}

pub struct EnrichmentWorkflow {
    store: Arc<dyn DirectoryStore>,
    repo_host: Arc<dyn RepoHost>,
    llm: Arc<dyn LlmProvider>,
    cache: Option<Arc<ListingCache>>,
}

impl EnrichmentWorkflow {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        repo_host: Arc<dyn RepoHost>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            store,
            repo_host,
            llm,
            cache: None,
        }
    }

    /// Purge cached listing results as the workflow mutates entries.
    pub fn with_cache(mut self, cache: Arc<ListingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn purge_listing_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_tag(SERVERS_TAG);
        }
    }

    pub async fn run(
        &self,
        request: &CreateServerRequest,
    ) -> Result<EnrichmentReport, EnrichmentError> {
        let entry = self.create_entry(request)?;
        self.purge_listing_cache();
        info!(entry_id = %entry.id, slug = %entry.slug, "Entry created, enriching");

        let target_repo_url = request.repo_url.clone().or_else(|| {
            if request.homepage_url.contains("github.com") {
                info!(homepage_url = %request.homepage_url, "Using homepage URL as repo URL");
                Some(request.homepage_url.trim().to_string())
            } else {
                None
            }
        });

        let stats = self
            .fetch_and_store_stats(&entry, target_repo_url.as_deref())
            .await;

        let short_desc = self
            .generate_summary(request, &entry, &stats, target_repo_url.as_deref())
            .await;

        let categories = self.categorize(request, &entry, &short_desc).await;
        self.purge_listing_cache();

        info!(
            slug = %entry.slug,
            categories = categories.len(),
            stars = stats.stars,
            "Entry enrichment completed"
        );

        Ok(EnrichmentReport {
            entry_id: entry.id,
            slug: entry.slug,
            name: entry.name,
            short_desc,
            long_desc: entry.long_desc,
            stats,
            categories,
            processing_complete: true,
        })
    }

    /// Step 1: validate and insert. The event is delivered at least once, so
    /// an entry already created for this homepage URL + name is reused
    /// instead of inserted again.
    fn create_entry(&self, request: &CreateServerRequest) -> Result<Entry, EnrichmentError> {
        let name = request.name.trim();
        let homepage_url = request.homepage_url.trim();
        if name.is_empty() || homepage_url.is_empty() {
            return Err(EnrichmentError::MissingFields);
        }

        if let Some(existing) = self.store.find_entry_by_homepage_url(homepage_url)? {
            if existing.name == name {
                info!(
                    entry_id = %existing.id,
                    "Entry already exists for this payload, reusing (redelivered event)"
                );
                return Ok(existing);
            }
        }

        let slug = unique_slug(name, |candidate| {
            self.store.slug_exists(candidate).unwrap_or(true)
        });

        let entry = self.store.insert_entry(&NewEntry {
            name: name.to_string(),
            slug,
            short_desc: PLACEHOLDER_SHORT_DESC.to_string(),
            homepage_url: Some(homepage_url.to_string()),
            repo_url: request.repo_url.clone(),
            docs_url: request.docs_url.clone(),
            logo_url: request.logo_url.clone(),
        })?;
        Ok(entry)
    }

    /// Step 2: stats and README are fetched concurrently and joined; any
    /// failure is logged and the zero-value defaults from creation stand.
    async fn fetch_and_store_stats(
        &self,
        entry: &Entry,
        target_repo_url: Option<&str>,
    ) -> RepoStatsSummary {
        let Some(url) = target_repo_url else {
            info!(entry_id = %entry.id, "No repository URL target, skipping stats");
            return RepoStatsSummary::default();
        };

        let Some(repo) = parse_repo_url(url) else {
            warn!(entry_id = %entry.id, url, "Repository URL is not a recognized GitHub URL");
            return RepoStatsSummary::default();
        };

        let (stats_result, readme_result) = tokio::join!(
            self.repo_host.fetch_stats(&repo),
            self.repo_host.fetch_readme(&repo)
        );

        let readme = match readme_result {
            Ok(readme) => readme,
            Err(e) => {
                warn!(entry_id = %entry.id, repo = %repo, "Failed to fetch README: {:#}", e);
                None
            }
        };

        let fetched = match stats_result {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(entry_id = %entry.id, repo = %repo, "Failed to fetch repo stats: {:#}", e);
                return RepoStatsSummary::default();
            }
        };

        let license = fetched.license_key.clone().unwrap_or_else(|| "unknown".to_string());
        let patch = RepoStatsPatch {
            stars: fetched.stars,
            last_commit: fetched.last_push,
            license: license.clone(),
            readme,
        };
        if let Err(e) = self.store.update_repo_stats(&entry.id, &patch) {
            warn!(entry_id = %entry.id, "Failed to persist repo stats: {:#}", e);
            return RepoStatsSummary::default();
        }

        info!(entry_id = %entry.id, stars = fetched.stars, license = %license, "Repo stats updated");
        RepoStatsSummary {
            stars: fetched.stars,
            forks: fetched.forks,
            last_commit: fetched.last_push,
            license,
        }
    }

    /// Step 3: generate and persist the short description. Returns the
    /// description the entry ends up with either way.
    async fn generate_summary(
        &self,
        request: &CreateServerRequest,
        entry: &Entry,
        stats: &RepoStatsSummary,
        target_repo_url: Option<&str>,
    ) -> String {
        let mut variables = BTreeMap::new();
        variables.insert("server_name", entry.name.clone());
        variables.insert("homepage_url", request.homepage_url.clone());
        variables.insert("repo_url", target_repo_url.unwrap_or("").to_string());
        variables.insert(
            "repo_stats",
            json!({
                "stars": stats.stars,
                "forks": stats.forks,
                "license": stats.license,
                "lastCommit": stats.last_commit,
            })
            .to_string(),
        );
        variables.insert(
            "additional_context",
            request.ai_context.clone().unwrap_or_default(),
        );

        let object_request = ObjectRequest::new(
            SUMMARY_SYSTEM_PROMPT,
            render_template(SUMMARY_TEMPLATE, &variables),
            "GenerateContentResponse",
            summary_schema(),
        );

        let response = match self.llm.generate_object(&object_request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(entry_id = %entry.id, "Failed to generate summary: {}", e);
                return entry.short_desc.clone();
            }
        };

        if let Some(usage) = response.usage {
            info!(
                entry_id = %entry.id,
                tokens = usage.total_tokens,
                "Summary generated"
            );
        }

        let summary = match serde_json::from_value::<GeneratedSummary>(response.object) {
            Ok(generated) => clamp_summary(&generated.summary),
            Err(e) => {
                warn!(entry_id = %entry.id, "Summary response had unexpected structure: {}", e);
                return entry.short_desc.clone();
            }
        };

        if let Err(e) = self.store.update_short_desc(&entry.id, &summary) {
            warn!(entry_id = %entry.id, "Failed to persist summary: {:#}", e);
            return entry.short_desc.clone();
        }
        summary
    }

    /// Step 4: classify into the mutable taxonomy. An LLM failure collapses
    /// into the empty categorization, which the fallback then covers, so the
    /// entry always ends up with at least one category unless the store
    /// itself is failing.
    async fn categorize(
        &self,
        request: &CreateServerRequest,
        entry: &Entry,
        short_desc: &str,
    ) -> Vec<String> {
        let categorization = match self.ask_for_categories(request, entry, short_desc).await {
            Ok(categorization) => categorization,
            Err(e) => {
                warn!(entry_id = %entry.id, "Failed to categorize: {:#}", e);
                Categorization::default()
            }
        };

        match self.apply_categories(entry, categorization) {
            Ok(assigned) => assigned,
            Err(e) => {
                warn!(entry_id = %entry.id, "Failed to assign categories: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn ask_for_categories(
        &self,
        request: &CreateServerRequest,
        entry: &Entry,
        short_desc: &str,
    ) -> anyhow::Result<Categorization> {
        let existing = self.store.all_categories()?;
        let names: Vec<String> = existing.into_iter().map(|c| c.name).collect();

        let mut variables = BTreeMap::new();
        variables.insert("server_name", entry.name.clone());
        variables.insert("categories", names.join(","));
        variables.insert(
            "additional_context",
            request.ai_context.clone().unwrap_or_default(),
        );
        variables.insert("short_description", short_desc.to_string());

        let object_request = ObjectRequest::new(
            CATEGORIZE_SYSTEM_PROMPT,
            render_template(CATEGORIZE_TEMPLATE, &variables),
            "CategorizeServerResponse",
            categorize_schema(),
        );

        let response = self.llm.generate_object(&object_request).await?;
        let categorization: Categorization = serde_json::from_value(response.object)?;
        info!(
            entry_id = %entry.id,
            matched = categorization.categories.len(),
            new = categorization.categories_to_add.len(),
            "Categorization result"
        );
        Ok(categorization)
    }

    fn apply_categories(
        &self,
        entry: &Entry,
        categorization: Categorization,
    ) -> anyhow::Result<Vec<String>> {
        if !categorization.categories_to_add.is_empty() {
            self.store
                .create_categories(&categorization.categories_to_add)?;
        }

        let mut merged = categorization.categories;
        merged.extend(categorization.categories_to_add);

        if merged.is_empty() {
            self.store
                .create_categories(&[FALLBACK_CATEGORY.to_string()])?;
            merged.push(FALLBACK_CATEGORY.to_string());
            info!(entry_id = %entry.id, "No categories matched, using fallback");
        }

        self.store.set_entry_categories(&entry.id, &merged)
    }
}

#[async_trait]
impl EventHandler for EnrichmentWorkflow {
    fn event(&self) -> &'static str {
        SERVER_CREATED_EVENT
    }

    async fn handle(&self, payload: Value) -> Result<Value, HandlerError> {
        let request: CreateServerRequest = serde_json::from_value(payload)
            .map_err(|e| HandlerError::Terminal(format!("Malformed payload: {}", e)))?;

        match self.run(&request).await {
            Ok(report) => serde_json::to_value(&report)
                .map_err(|e| HandlerError::Terminal(format!("Unserializable report: {}", e))),
            Err(e @ EnrichmentError::MissingFields) => Err(HandlerError::Terminal(e.to_string())),
            Err(EnrichmentError::Store(e)) => Err(HandlerError::Retryable(e)),
        }
    }
}

//! Repository host client: stats and README for a GitHub repository.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("mcp-directory-server/", env!("CARGO_PKG_VERSION"));

/// owner/name pair parsed out of a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse "https://github.com/owner/name[.git][/...]" into a RepoRef.
/// Returns None for URLs that do not point at github.com.
pub fn parse_repo_url(url: &str) -> Option<RepoRef> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("https://www.github.com/"))?;

    let mut parts = rest.split('/').filter(|p| !p.is_empty());
    let owner = parts.next()?.to_string();
    let name = parts.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(RepoRef { owner, name })
}

#[derive(Debug, Clone, Default)]
pub struct RepoStats {
    pub stars: i64,
    pub forks: i64,
    pub last_push: Option<DateTime<Utc>>,
    pub license_key: Option<String>,
    pub license_name: Option<String>,
}

/// External repository metadata host. Stats and README fetches can fail
/// independently.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait RepoHost: Send + Sync {
    async fn fetch_stats(&self, repo: &RepoRef) -> Result<RepoStats>;

    /// Decoded README text; Ok(None) when the repository has none.
    async fn fetch_readme(&self, repo: &RepoRef) -> Result<Option<String>>;
}

pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_API_BASE, token)
    }

    /// Point at a different API base; used by tests to talk to a stub.
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    stargazers_count: i64,
    forks_count: i64,
    pushed_at: Option<String>,
    license: Option<LicenseResponse>,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    key: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadmeResponse {
    content: String,
    encoding: String,
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn fetch_stats(&self, repo: &RepoRef) -> Result<RepoStats> {
        let response = self
            .get(&format!("/repos/{}/{}", repo.owner, repo.name))
            .send()
            .await
            .with_context(|| format!("Stats request failed for {}", repo))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Stats request for {} returned {}", repo, status);
        }

        let body: RepoResponse = response
            .json()
            .await
            .with_context(|| format!("Malformed stats response for {}", repo))?;

        debug!(repo = %repo, stars = body.stargazers_count, "Fetched repository stats");

        Ok(RepoStats {
            stars: body.stargazers_count,
            forks: body.forks_count,
            last_push: body.pushed_at.as_deref().and_then(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
            }),
            license_key: body.license.as_ref().and_then(|l| l.key.clone()),
            license_name: body.license.and_then(|l| l.name),
        })
    }

    async fn fetch_readme(&self, repo: &RepoRef) -> Result<Option<String>> {
        let response = self
            .get(&format!("/repos/{}/{}/readme", repo.owner, repo.name))
            .send()
            .await
            .with_context(|| format!("README request failed for {}", repo))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            bail!("README request for {} returned {}", repo, status);
        }

        let body: ReadmeResponse = response
            .json()
            .await
            .with_context(|| format!("Malformed README response for {}", repo))?;

        if body.encoding != "base64" {
            bail!("Unexpected README encoding '{}' for {}", body.encoding, repo);
        }

        // The contents API inserts newlines into the base64 payload.
        let compact: String = body.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .with_context(|| format!("Invalid base64 README for {}", repo))?;
        let text =
            String::from_utf8(bytes).map_err(|_| anyhow!("README for {} is not UTF-8", repo))?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_repo_url() {
        let repo = parse_repo_url("https://github.com/acme/test").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "test");
    }

    #[test]
    fn parse_strips_git_suffix_and_extra_path() {
        let repo = parse_repo_url("https://github.com/acme/test.git").unwrap();
        assert_eq!(repo.name, "test");

        let repo = parse_repo_url("https://github.com/acme/test/tree/main/src").unwrap();
        assert_eq!(repo.to_string(), "acme/test");
    }

    #[test]
    fn parse_rejects_non_github_urls() {
        assert!(parse_repo_url("https://gitlab.com/acme/test").is_none());
        assert!(parse_repo_url("https://example.com").is_none());
        assert!(parse_repo_url("https://github.com/only-owner").is_none());
        assert!(parse_repo_url("not a url").is_none());
    }

    #[test]
    fn readme_base64_with_newlines_decodes() {
        // "hello world" base64-encoded and split the way the contents API does.
        let content = "aGVsbG8g\nd29ybGQ=\n";
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "hello world");
    }
}

//! Background enrichment of newly created entries: repository stats, an
//! LLM-generated summary, and LLM-driven categorization.

mod github;
mod prompts;
mod workflow;

pub use github::{parse_repo_url, GitHubClient, RepoHost, RepoRef, RepoStats};
pub use prompts::{
    render_template, Categorization, GeneratedSummary, SHORT_DESC_MAX_LEN,
};
pub use workflow::{
    CreateServerRequest, EnrichmentError, EnrichmentReport, EnrichmentWorkflow, RepoStatsSummary,
    FALLBACK_CATEGORY, PLACEHOLDER_SHORT_DESC, SERVER_CREATED_EVENT,
};

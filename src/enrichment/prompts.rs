//! Prompt templates for the enrichment workflow.
//!
//! Templates are plain strings with `{{name}}` placeholders; rendering is a
//! pure function of the template and a variable map, so provider-specific
//! formatting never leaks into the workflow.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Ceiling for generated short descriptions (search-engine snippet length).
pub const SHORT_DESC_MAX_LEN: usize = 160;

/// Replace every `{{key}}` with its value. Unknown placeholders are left in
/// place so a missing variable is visible in logs instead of silently blank.
pub fn render_template(template: &str, variables: &BTreeMap<&str, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in variables {
        rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
    }
    rendered
}

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert at summarizing MCP (Model Context \
    Protocol) servers. Create concise, engaging summaries that explain what the server does.";

pub const SUMMARY_TEMPLATE: &str = "\
Given the following inputs about an MCP server, generate a concise summary.

**Server Name:** {{server_name}}
**Homepage URL:** {{homepage_url}}
**Repository URL:** {{repo_url}}
**Repository Stats:** {{repo_stats}}
**Additional Context:** {{additional_context}}

Generate a summary that:
- Is under 160 characters for SEO
- Clearly explains what the server does
- Focuses on the primary function/capability
- Is engaging and clear
- Doesn't start with \"MCP Server that\" or \"This MCP Server provides\"
- Goes straight to describing what it does (e.g. \"Manages cloud infrastructure\", \"Provides weather data\", etc.)

Keep it simple and focused on the core value proposition.";

pub const CATEGORIZE_SYSTEM_PROMPT: &str = "You are an expert at categorizing MCP (Model Context \
    Protocol) servers. Focus on what the MCP server does functionally, not the technology stack. \
    Remember: these are MCP servers, not general open source projects.";

pub const CATEGORIZE_TEMPLATE: &str = "\
You are tasked to assign the following MCP server to the most relevant category/categories.

You are given the server details and current list of categories in the database. You should \
assign the server to the relevant categories, but if none of them are relevant, you should add \
a new category.

**Server Name:** {{server_name}}
**Existing Categories:** {{categories}}
**Additional Context:** {{additional_context}}
**Short Description:** {{short_description}}

Examples of good MCP server categories: \"API Tools\", \"File Management\", \"Database\", \
\"Web Scraping\", \"AI/ML\", \"Development Tools\", \"System Monitoring\", \"Data Processing\", \
\"Communication\", \"Authentication\".

Return a JSON object with exactly these two properties:
- \"categories\": array of existing category names that match this server
- \"categoriesToAdd\": array of new category names to create if no existing ones fit

Requirements:
- Focus on what the MCP server does functionally, not the technology stack
- Do not force-assign categories when none are relevant - add new ones instead
- Keep category names short and focused on MCP server functionality
- Assign 1-3 categories maximum";

/// Schema for the summary call.
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "A brief, one-sentence overview of the MCP server (max 160 characters for SEO)"
            }
        },
        "required": ["summary"],
        "additionalProperties": false
    })
}

/// Schema for the categorization call.
pub fn categorize_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "categories": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Existing categories that match the MCP server"
            },
            "categoriesToAdd": {
                "type": "array",
                "items": {"type": "string"},
                "description": "New categories to be created if none exist"
            }
        },
        "required": ["categories", "categoriesToAdd"],
        "additionalProperties": false
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSummary {
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Categorization {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, rename = "categoriesToAdd")]
    pub categories_to_add: Vec<String>,
}

/// Truncate on a char boundary; generated summaries are bounded by contract
/// but the bound is enforced here, not trusted.
pub fn clamp_summary(summary: &str) -> String {
    if summary.chars().count() <= SHORT_DESC_MAX_LEN {
        return summary.to_string();
    }
    summary.chars().take(SHORT_DESC_MAX_LEN).collect()
}

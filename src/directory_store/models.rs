//! Row types for the directory database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One directory listing, fully hydrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub short_desc: String,
    pub long_desc: Option<String>,
    pub homepage_url: Option<String>,
    pub repo_url: Option<String>,
    pub docs_url: Option<String>,
    pub logo_url: Option<String>,
    /// None means "unknown" rather than zero.
    pub stars: Option<i64>,
    pub last_commit: Option<DateTime<Utc>>,
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection: what the browse grid needs, plus the full-text rank
/// when the page came from a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub short_desc: String,
    pub homepage_url: Option<String>,
    pub repo_url: Option<String>,
    pub logo_url: Option<String>,
    pub stars: Option<i64>,
    pub license: Option<String>,
    pub created_at: DateTime<Utc>,
    /// bm25 rank for full-text matches (lower is better); None for rows that
    /// only matched the substring fallback, and for unfiltered listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

/// Fields for a fresh entry. The store assigns id and timestamps; stats
/// start at zero/unknown.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub name: String,
    pub slug: String,
    pub short_desc: String,
    pub homepage_url: Option<String>,
    pub repo_url: Option<String>,
    pub docs_url: Option<String>,
    pub logo_url: Option<String>,
}

/// Repository-host numbers persisted by the stats step.
#[derive(Debug, Clone)]
pub struct RepoStatsPatch {
    pub stars: i64,
    pub last_commit: Option<DateTime<Utc>>,
    pub license: String,
    pub readme: Option<String>,
}

/// Admin-side edit of an entry. `None` leaves the column untouched for
/// optional text fields; required fields are always written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub homepage_url: Option<String>,
    pub repo_url: Option<String>,
    pub docs_url: Option<String>,
    pub logo_url: Option<String>,
    pub stars: Option<i64>,
    pub license: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub server_name: String,
    pub repo_url: String,
    pub description: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub name: String,
    pub email: String,
    pub server_name: String,
    pub repo_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRunStatus {
    Running,
    Completed,
    Failed,
}

impl EventRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventRunStatus::Running => "running",
            EventRunStatus::Completed => "completed",
            EventRunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(EventRunStatus::Running),
            "completed" => Some(EventRunStatus::Completed),
            "failed" => Some(EventRunStatus::Failed),
            _ => None,
        }
    }
}

/// One dispatcher invocation of an event handler, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct EventRun {
    pub id: i64,
    pub event: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: EventRunStatus,
    pub attempts: i64,
    pub error: Option<String>,
}

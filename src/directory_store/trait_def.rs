//! DirectoryStore trait definition.

use super::models::{
    Category, Entry, EntryPatch, EntrySummary, EventRun, EventRunStatus, NewEntry, NewSubmission,
    RepoStatsPatch, Submission, SubmissionStatus,
};
use crate::listing::{ListingQuery, Page};
use anyhow::Result;

/// Storage backend for the directory. Calls are synchronous; SQLite
/// round-trips are short enough that routes and the workflow call them
/// inline.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait DirectoryStore: Send + Sync {
    // Entries

    /// Insert a fresh entry with zero/unknown stats. The store assigns the
    /// id and both timestamps.
    fn insert_entry(&self, new: &NewEntry) -> Result<Entry>;

    fn get_entry(&self, id: &str) -> Result<Option<Entry>>;

    fn get_entry_by_slug(&self, slug: &str) -> Result<Option<Entry>>;

    /// Lookup by homepage URL; the workflow's create step uses this as its
    /// retry guard before inserting.
    fn find_entry_by_homepage_url(&self, homepage_url: &str) -> Result<Option<Entry>>;

    /// Lookup by repository URL; submission dedup.
    fn find_entry_by_repo_url(&self, repo_url: &str) -> Result<Option<Entry>>;

    fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Persist the stats step's output onto an entry.
    fn update_repo_stats(&self, entry_id: &str, patch: &RepoStatsPatch) -> Result<()>;

    /// Persist the generated summary onto an entry's short description.
    fn update_short_desc(&self, entry_id: &str, short_desc: &str) -> Result<()>;

    /// Admin edit. Returns the updated entry, or None when the id is unknown.
    fn update_entry(&self, entry_id: &str, patch: &EntryPatch) -> Result<Option<Entry>>;

    /// Returns true when a row was deleted.
    fn delete_entry(&self, entry_id: &str) -> Result<bool>;

    /// The listing query engine: filter (full-text OR substring), sort with
    /// id tie-break, paginate. Count and page share one predicate but are
    /// separate reads.
    fn list_entries(&self, query: &ListingQuery) -> Result<Page<EntrySummary>>;

    // Categories

    fn all_categories(&self) -> Result<Vec<Category>>;

    /// Create categories by name, skipping names that already exist.
    /// Returns the rows for every requested name, existing or fresh.
    fn create_categories(&self, names: &[String]) -> Result<Vec<Category>>;

    /// Replace an entry's associations with the categories named: clear all
    /// prior links, then insert the new set, in one transaction. Names that
    /// match no category row are skipped. Returns the assigned names.
    fn set_entry_categories(&self, entry_id: &str, names: &[String]) -> Result<Vec<String>>;

    fn categories_for_entry(&self, entry_id: &str) -> Result<Vec<Category>>;

    // Submissions

    fn insert_submission(&self, new: &NewSubmission) -> Result<Submission>;

    fn submission_exists_for_repo(&self, repo_url: &str) -> Result<bool>;

    fn get_submission(&self, id: &str) -> Result<Option<Submission>>;

    fn list_submissions(&self, status: Option<SubmissionStatus>) -> Result<Vec<Submission>>;

    /// Returns true when a row was updated.
    fn set_submission_status(&self, id: &str, status: SubmissionStatus) -> Result<bool>;

    // Event runs

    fn record_event_start(&self, event: &str) -> Result<i64>;

    fn record_event_finish(
        &self,
        run_id: i64,
        status: EventRunStatus,
        attempts: i64,
        error: Option<String>,
    ) -> Result<()>;

    fn recent_event_runs(&self, limit: usize) -> Result<Vec<EventRun>>;
}

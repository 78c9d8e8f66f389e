//! Directory persistence: entries, categories, associations, submissions,
//! and dispatcher run history, all in one SQLite database.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{
    Category, Entry, EntryPatch, EntrySummary, EventRun, EventRunStatus, NewEntry, NewSubmission,
    RepoStatsPatch, Submission, SubmissionStatus,
};
pub use store::SqliteDirectoryStore;
pub use trait_def::DirectoryStore;

//! MCP Directory Server Library
//!
//! Exposes the internal modules for the e2e test suite and potential reuse.

pub mod config;
pub mod directory_store;
pub mod dispatch;
pub mod enrichment;
pub mod listing;
pub mod llm;
pub mod server;
pub mod slug;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use directory_store::{DirectoryStore, SqliteDirectoryStore};
pub use enrichment::{EnrichmentWorkflow, SERVER_CREATED_EVENT};
pub use listing::{ListingCache, ListingQuery};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};

//! Listing query contract: search, sort, pagination.
//!
//! The store executes these queries; this module owns the parameter types,
//! the sort-key vocabulary, and the pagination math so routes, cache, and
//! store all agree on what a page is.

mod cache;

pub use cache::{ListingCache, SERVERS_TAG};

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Hard ceiling applied by the HTTP layer; the engine itself does not bound
/// `limit`.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Created,
    Name,
    Stars,
    Commit,
}

impl SortField {
    /// Parse a sort key from a query string value. Unrecognized values fall
    /// back to creation time, matching the listing contract.
    pub fn parse(s: &str) -> Self {
        match s {
            "name" => SortField::Name,
            "stars" => SortField::Stars,
            "commit" | "last_commit" | "lastCommit" => SortField::Commit,
            "created" | "createdAt" => SortField::Created,
            _ => SortField::Created,
        }
    }

    pub fn sql_column(&self) -> &'static str {
        match self {
            SortField::Created => "e.created_at",
            SortField::Name => "e.name COLLATE NOCASE",
            SortField::Stars => "e.stars",
            SortField::Commit => "e.last_commit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Self {
        match s {
            "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One listing request. `search` empty or whitespace means no filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingQuery {
    pub search: String,
    pub page: usize,
    pub limit: usize,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: SortField::Created,
            direction: SortDirection::Desc,
        }
    }
}

impl ListingQuery {
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1) * self.limit
    }

    pub fn search_terms(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(total: usize, query: &ListingQuery) -> Self {
        Self {
            total,
            total_pages: total.div_ceil(query.limit.max(1)),
            current_page: query.page,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

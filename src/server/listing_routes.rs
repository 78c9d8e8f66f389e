//! Public read routes: listing, entry detail, categories.

use super::state::{GuardedDirectoryStore, ServerState};
use crate::directory_store::{Category, Entry};
use crate::listing::{
    ListingQuery, SortDirection, SortField, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Deserialize, Debug)]
pub struct ListingParams {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

impl ListingParams {
    /// Normalize query-string input into the engine's contract: page >= 1,
    /// limit clamped to sane bounds, unknown sort keys falling back.
    pub fn into_query(self) -> ListingQuery {
        ListingQuery {
            search: self.q.unwrap_or_default(),
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            sort: SortField::parse(self.sort.as_deref().unwrap_or("")),
            direction: self
                .dir
                .map(|d| SortDirection::parse(&d))
                .unwrap_or(SortDirection::Desc),
        }
    }
}

pub async fn list_servers(
    State(state): State<ServerState>,
    Query(params): Query<ListingParams>,
) -> Response {
    let query = params.into_query();

    if let Some(page) = state.cache.get(&query) {
        return Json(page).into_response();
    }

    match state.store.list_entries(&query) {
        Ok(page) => {
            state.cache.put(query, page.clone(), Vec::new());
            Json(page).into_response()
        }
        Err(e) => {
            error!("Failed to list entries: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Serialize)]
pub struct EntryDetail {
    #[serde(flatten)]
    pub entry: Entry,
    pub categories: Vec<Category>,
}

pub async fn get_server(
    State(store): State<GuardedDirectoryStore>,
    Path(slug): Path<String>,
) -> Response {
    let entry = match store.get_entry_by_slug(&slug) {
        Ok(Some(entry)) => entry,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to load entry {}: {:#}", slug, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match store.categories_for_entry(&entry.id) {
        Ok(categories) => Json(EntryDetail { entry, categories }).into_response(),
        Err(e) => {
            error!("Failed to load categories for {}: {:#}", slug, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn get_categories(State(store): State<GuardedDirectoryStore>) -> Response {
    match store.all_categories() {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => {
            error!("Failed to list categories: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_normalize_into_query() {
        let params = ListingParams {
            q: Some("weather".to_string()),
            page: Some(0),
            limit: Some(5000),
            sort: Some("stars".to_string()),
            dir: Some("asc".to_string()),
        };
        let query = params.into_query();
        assert_eq!(query.search, "weather");
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.sort, SortField::Stars);
        assert_eq!(query.direction, SortDirection::Asc);
    }

    #[test]
    fn params_defaults() {
        let params = ListingParams {
            q: None,
            page: None,
            limit: None,
            sort: None,
            dir: None,
        };
        let query = params.into_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort, SortField::Created);
        assert_eq!(query.direction, SortDirection::Desc);
    }
}

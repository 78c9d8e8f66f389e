//! Tagged TTL cache for composed listing results.
//!
//! Keyed by the full query tuple. Every cached value carries a set of tags;
//! mutations purge by tag (`servers` on any entry write) rather than by key,
//! so callers never need to know which query tuples are live.

use super::{ListingQuery, Page};
use crate::directory_store::EntrySummary;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tag attached to every listing result; purged on any entry mutation.
pub const SERVERS_TAG: &str = "servers";

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CachedPage {
    stored_at: Instant,
    tags: Vec<String>,
    page: Page<EntrySummary>,
}

pub struct ListingCache {
    ttl: Duration,
    entries: Mutex<HashMap<ListingQuery, CachedPage>>,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, query: &ListingQuery) -> Option<Page<EntrySummary>> {
        let entries = self.entries.lock().unwrap();
        let cached = entries.get(query)?;
        if cached.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(cached.page.clone())
    }

    pub fn put(&self, query: ListingQuery, page: Page<EntrySummary>, extra_tags: Vec<String>) {
        let mut tags = vec![SERVERS_TAG.to_string()];
        tags.extend(extra_tags);
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            query,
            CachedPage {
                stored_at: Instant::now(),
                tags,
                page,
            },
        );
    }

    /// Drop every cached result carrying `tag`. Returns how many were purged.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, cached| !cached.tags.iter().any(|t| t == tag));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Pagination;

    fn empty_page(query: &ListingQuery) -> Page<EntrySummary> {
        Page {
            items: Vec::new(),
            pagination: Pagination::new(0, query),
        }
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ListingCache::default();
        let query = ListingQuery::default();
        cache.put(query.clone(), empty_page(&query), Vec::new());

        assert!(cache.get(&query).is_some());
    }

    #[test]
    fn expired_value_is_a_miss() {
        let cache = ListingCache::new(Duration::from_millis(0));
        let query = ListingQuery::default();
        cache.put(query.clone(), empty_page(&query), Vec::new());

        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&query).is_none());
    }

    #[test]
    fn different_query_tuples_do_not_collide() {
        let cache = ListingCache::default();
        let first = ListingQuery::default();
        let second = ListingQuery {
            page: 2,
            ..Default::default()
        };
        cache.put(first.clone(), empty_page(&first), Vec::new());

        assert!(cache.get(&first).is_some());
        assert!(cache.get(&second).is_none());
    }

    #[test]
    fn servers_tag_purges_everything() {
        let cache = ListingCache::default();
        let first = ListingQuery::default();
        let second = ListingQuery {
            search: "db".to_string(),
            ..Default::default()
        };
        cache.put(first.clone(), empty_page(&first), Vec::new());
        cache.put(second.clone(), empty_page(&second), Vec::new());

        let purged = cache.invalidate_tag(SERVERS_TAG);
        assert_eq!(purged, 2);
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_none());
    }

    #[test]
    fn custom_tag_purges_only_tagged_results() {
        let cache = ListingCache::default();
        let first = ListingQuery::default();
        let second = ListingQuery {
            page: 2,
            ..Default::default()
        };
        cache.put(
            first.clone(),
            empty_page(&first),
            vec!["category-database".to_string()],
        );
        cache.put(second.clone(), empty_page(&second), Vec::new());

        let purged = cache.invalidate_tag("category-database");
        assert_eq!(purged, 1);
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());
    }
}

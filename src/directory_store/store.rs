//! SQLite-backed directory store implementation.

use super::models::{
    Category, Entry, EntryPatch, EntrySummary, EventRun, EventRunStatus, NewEntry, NewSubmission,
    RepoStatsPatch, Submission, SubmissionStatus,
};
use super::schema::DIRECTORY_VERSIONED_SCHEMAS;
use super::trait_def::DirectoryStore;
use crate::listing::{ListingQuery, Page, Pagination};
use crate::slug::unique_slug;
use crate::sqlite_persistence::open_versioned;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

/// SQLite-backed directory store with split read/write connections (WAL).
#[derive(Clone)]
pub struct SqliteDirectoryStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

fn format_ts(dt: &DateTime<Utc>) -> String {
    // Fixed-width so lexicographic ORDER BY on the column is chronological.
    dt.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_ts_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Escape LIKE wildcards in user input; the queries use `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Quote a user query for FTS5 MATCH so its operators are inert.
fn fts_match_query(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

impl SqliteDirectoryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open directory database")?;

        open_versioned(&mut write_conn, DIRECTORY_VERSIONED_SCHEMAS)?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on write connection")?;

        // The search index lives outside the versioned schema: virtual
        // tables cannot be described by the table DSL, and it is rebuilt
        // from the entries table on every open anyway.
        write_conn.execute_batch(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS entries_fts USING fts5(
                entry_id UNINDEXED,
                name,
                short_desc,
                long_desc,
                tokenize='trigram'
            );
        "#,
        )?;
        Self::rebuild_fts_index(&write_conn)?;

        let read_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open directory database for reading")?;
        read_conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let entries: i64 = read_conn.query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
        info!("Directory store ready: {} entries", entries);

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }

    fn rebuild_fts_index(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM entries_fts", [])?;
        conn.execute(
            "INSERT INTO entries_fts (entry_id, name, short_desc, long_desc)
             SELECT id, name, short_desc, COALESCE(long_desc, '') FROM entries",
            [],
        )?;
        Ok(())
    }

    fn refresh_fts_row(conn: &Connection, entry: &Entry) -> Result<()> {
        conn.execute(
            "DELETE FROM entries_fts WHERE entry_id = ?1",
            params![entry.id],
        )?;
        conn.execute(
            "INSERT INTO entries_fts (entry_id, name, short_desc, long_desc) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.name,
                entry.short_desc,
                entry.long_desc.as_deref().unwrap_or("")
            ],
        )?;
        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(Entry {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            short_desc: row.get("short_desc")?,
            long_desc: row.get("long_desc")?,
            homepage_url: row.get("homepage_url")?,
            repo_url: row.get("repo_url")?,
            docs_url: row.get("docs_url")?,
            logo_url: row.get("logo_url")?,
            stars: row.get("stars")?,
            last_commit: parse_ts_opt(row.get("last_commit")?),
            license: row.get("license")?,
            readme: row.get("readme")?,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }

    fn get_entry_where(&self, predicate: &str, value: &str) -> Result<Option<Entry>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT * FROM entries WHERE {} = ?1 LIMIT 1",
            predicate
        ))?;
        let entry = stmt
            .query_row(params![value], Self::row_to_entry)
            .optional()?;
        Ok(entry)
    }

    fn row_to_submission(row: &rusqlite::Row) -> rusqlite::Result<Submission> {
        let status: String = row.get("status")?;
        let created_at: String = row.get("created_at")?;
        Ok(Submission {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            server_name: row.get("server_name")?,
            repo_url: row.get("repo_url")?,
            description: row.get("description")?,
            status: SubmissionStatus::parse(&status).unwrap_or(SubmissionStatus::Pending),
            created_at: parse_ts(&created_at),
        })
    }

    fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<EntrySummary> {
        let created_at: String = row.get(9)?;
        Ok(EntrySummary {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            short_desc: row.get(3)?,
            homepage_url: row.get(4)?,
            repo_url: row.get(5)?,
            logo_url: row.get(6)?,
            stars: row.get(7)?,
            license: row.get(8)?,
            created_at: parse_ts(&created_at),
            rank: row.get(10)?,
        })
    }
}

const SUMMARY_COLUMNS: &str = "e.id, e.name, e.slug, e.short_desc, e.homepage_url, e.repo_url, \
     e.logo_url, e.stars, e.license, e.created_at";

const SEARCH_PREDICATE: &str = "f.entry_id IS NOT NULL
   OR e.name LIKE ?2 ESCAPE '\\'
   OR e.short_desc LIKE ?2 ESCAPE '\\'
   OR COALESCE(e.long_desc, '') LIKE ?2 ESCAPE '\\'";

const FTS_MATCHES_CTE: &str = "WITH fts_matches AS (
    SELECT entry_id, bm25(entries_fts) AS rank
    FROM entries_fts
    WHERE entries_fts MATCH ?1
)";

impl DirectoryStore for SqliteDirectoryStore {
    fn insert_entry(&self, new: &NewEntry) -> Result<Entry> {
        let now = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            slug: new.slug.clone(),
            short_desc: new.short_desc.clone(),
            long_desc: None,
            homepage_url: new.homepage_url.clone(),
            repo_url: new.repo_url.clone(),
            docs_url: new.docs_url.clone(),
            logo_url: new.logo_url.clone(),
            stars: Some(0),
            last_commit: None,
            license: Some("unknown".to_string()),
            readme: None,
            created_at: now,
            updated_at: now,
        };

        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO entries
             (id, name, slug, short_desc, long_desc, homepage_url, repo_url, docs_url, logo_url,
              stars, last_commit, license, readme, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                entry.id,
                entry.name,
                entry.slug,
                entry.short_desc,
                entry.long_desc,
                entry.homepage_url,
                entry.repo_url,
                entry.docs_url,
                entry.logo_url,
                entry.stars,
                entry.last_commit.as_ref().map(format_ts),
                entry.license,
                entry.readme,
                format_ts(&entry.created_at),
                format_ts(&entry.updated_at),
            ],
        )
        .context("Failed to insert entry")?;
        Self::refresh_fts_row(&conn, &entry)?;
        Ok(entry)
    }

    fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        self.get_entry_where("id", id)
    }

    fn get_entry_by_slug(&self, slug: &str) -> Result<Option<Entry>> {
        self.get_entry_where("slug", slug)
    }

    fn find_entry_by_homepage_url(&self, homepage_url: &str) -> Result<Option<Entry>> {
        self.get_entry_where("homepage_url", homepage_url)
    }

    fn find_entry_by_repo_url(&self, repo_url: &str) -> Result<Option<Entry>> {
        self.get_entry_where("repo_url", repo_url)
    }

    fn slug_exists(&self, slug: &str) -> Result<bool> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT 1 FROM entries WHERE slug = ?1")?;
        Ok(stmt.query_row(params![slug], |_| Ok(())).optional()?.is_some())
    }

    fn update_repo_stats(&self, entry_id: &str, patch: &RepoStatsPatch) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "UPDATE entries
             SET stars = ?1, last_commit = ?2, license = ?3,
                 readme = COALESCE(?4, readme), updated_at = ?5
             WHERE id = ?6",
            params![
                patch.stars,
                patch.last_commit.as_ref().map(format_ts),
                patch.license,
                patch.readme,
                format_ts(&Utc::now()),
                entry_id,
            ],
        )
        .context("Failed to update repo stats")?;
        Ok(())
    }

    fn update_short_desc(&self, entry_id: &str, short_desc: &str) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "UPDATE entries SET short_desc = ?1, updated_at = ?2 WHERE id = ?3",
            params![short_desc, format_ts(&Utc::now()), entry_id],
        )
        .context("Failed to update short description")?;

        let entry = conn
            .prepare_cached("SELECT * FROM entries WHERE id = ?1")?
            .query_row(params![entry_id], Self::row_to_entry)
            .optional()?;
        if let Some(entry) = entry {
            Self::refresh_fts_row(&conn, &entry)?;
        }
        Ok(())
    }

    fn update_entry(&self, entry_id: &str, patch: &EntryPatch) -> Result<Option<Entry>> {
        let conn = self.write_conn.lock().unwrap();
        let current = conn
            .prepare_cached("SELECT * FROM entries WHERE id = ?1")?
            .query_row(params![entry_id], Self::row_to_entry)
            .optional()?;

        let Some(mut entry) = current else {
            return Ok(None);
        };

        if let Some(name) = &patch.name {
            entry.name = name.clone();
        }
        if let Some(short_desc) = &patch.short_desc {
            entry.short_desc = short_desc.clone();
        }
        if patch.long_desc.is_some() {
            entry.long_desc = patch.long_desc.clone();
        }
        if patch.homepage_url.is_some() {
            entry.homepage_url = patch.homepage_url.clone();
        }
        if patch.repo_url.is_some() {
            entry.repo_url = patch.repo_url.clone();
        }
        if patch.docs_url.is_some() {
            entry.docs_url = patch.docs_url.clone();
        }
        if patch.logo_url.is_some() {
            entry.logo_url = patch.logo_url.clone();
        }
        if patch.stars.is_some() {
            entry.stars = patch.stars;
        }
        if patch.license.is_some() {
            entry.license = patch.license.clone();
        }
        entry.updated_at = Utc::now();

        conn.execute(
            "UPDATE entries
             SET name = ?1, short_desc = ?2, long_desc = ?3, homepage_url = ?4, repo_url = ?5,
                 docs_url = ?6, logo_url = ?7, stars = ?8, license = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                entry.name,
                entry.short_desc,
                entry.long_desc,
                entry.homepage_url,
                entry.repo_url,
                entry.docs_url,
                entry.logo_url,
                entry.stars,
                entry.license,
                format_ts(&entry.updated_at),
                entry_id,
            ],
        )
        .context("Failed to update entry")?;
        Self::refresh_fts_row(&conn, &entry)?;
        Ok(Some(entry))
    }

    fn delete_entry(&self, entry_id: &str) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM entries WHERE id = ?1", params![entry_id])?;
        conn.execute(
            "DELETE FROM entries_fts WHERE entry_id = ?1",
            params![entry_id],
        )?;
        Ok(affected > 0)
    }

    fn list_entries(&self, query: &ListingQuery) -> Result<Page<EntrySummary>> {
        let conn = self.read_conn.lock().unwrap();

        let order_by = format!(
            "ORDER BY {} {}, e.id ASC",
            query.sort.sql_column(),
            query.direction.sql_keyword()
        );

        let (total, items) = match query.search_terms() {
            None => {
                let total: usize = conn
                    .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get::<_, i64>(0))?
                    as usize;

                let sql = format!(
                    "SELECT {SUMMARY_COLUMNS}, NULL AS rank FROM entries e {order_by} LIMIT ?1 OFFSET ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map(
                        params![query.limit as i64, query.offset() as i64],
                        Self::row_to_summary,
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                (total, items)
            }
            Some(term) => {
                let match_query = fts_match_query(term);
                let pattern = like_pattern(term);

                let count_sql = format!(
                    "{FTS_MATCHES_CTE}
                     SELECT COUNT(*)
                     FROM entries e
                     LEFT JOIN fts_matches f ON f.entry_id = e.id
                     WHERE {SEARCH_PREDICATE}"
                );
                let total: usize = conn.query_row(
                    &count_sql,
                    params![match_query, pattern],
                    |r| r.get::<_, i64>(0),
                )? as usize;

                let page_sql = format!(
                    "{FTS_MATCHES_CTE}
                     SELECT {SUMMARY_COLUMNS}, f.rank
                     FROM entries e
                     LEFT JOIN fts_matches f ON f.entry_id = e.id
                     WHERE {SEARCH_PREDICATE}
                     {order_by}
                     LIMIT ?3 OFFSET ?4"
                );
                let mut stmt = conn.prepare(&page_sql)?;
                let items = stmt
                    .query_map(
                        params![
                            match_query,
                            pattern,
                            query.limit as i64,
                            query.offset() as i64
                        ],
                        Self::row_to_summary,
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                (total, items)
            }
        };

        Ok(Page {
            items,
            pagination: Pagination::new(total, query),
        })
    }

    fn all_categories(&self) -> Result<Vec<Category>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, slug, sort_order FROM categories ORDER BY sort_order, name",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                    sort_order: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn create_categories(&self, names: &[String]) -> Result<Vec<Category>> {
        let conn = self.write_conn.lock().unwrap();
        let mut result = Vec::with_capacity(names.len());

        for name in names {
            let existing = conn
                .prepare_cached("SELECT id, name, slug, sort_order FROM categories WHERE name = ?1")?
                .query_row(params![name], |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        slug: row.get(2)?,
                        sort_order: row.get(3)?,
                    })
                })
                .optional()?;

            if let Some(category) = existing {
                result.push(category);
                continue;
            }

            let slug = unique_slug(name, |candidate| {
                conn.prepare_cached("SELECT 1 FROM categories WHERE slug = ?1")
                    .and_then(|mut stmt| {
                        stmt.query_row(params![candidate], |_| Ok(())).optional()
                    })
                    .map(|found| found.is_some())
                    .unwrap_or(true)
            });

            let category = Category {
                id: Uuid::new_v4().to_string(),
                name: name.clone(),
                slug,
                sort_order: 0,
            };
            conn.execute(
                "INSERT INTO categories (id, name, slug, sort_order) VALUES (?1, ?2, ?3, ?4)",
                params![category.id, category.name, category.slug, category.sort_order],
            )
            .with_context(|| format!("Failed to create category {}", name))?;
            result.push(category);
        }

        Ok(result)
    }

    fn set_entry_categories(&self, entry_id: &str, names: &[String]) -> Result<Vec<String>> {
        let conn = self.write_conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM entry_categories WHERE entry_id = ?1",
            params![entry_id],
        )?;

        let mut assigned = Vec::with_capacity(names.len());
        if !names.is_empty() {
            let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            let sql = format!(
                "SELECT id, name FROM categories WHERE name IN ({})",
                placeholders
            );
            let mut stmt = tx.prepare(&sql)?;
            let matched: Vec<(String, String)> = stmt
                .query_map(rusqlite::params_from_iter(names.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<rusqlite::Result<_>>()?;
            drop(stmt);

            let mut insert = tx.prepare_cached(
                "INSERT INTO entry_categories (entry_id, category_id) VALUES (?1, ?2)",
            )?;
            for (category_id, name) in matched {
                insert.execute(params![entry_id, category_id])?;
                assigned.push(name);
            }
        }

        tx.commit()?;
        Ok(assigned)
    }

    fn categories_for_entry(&self, entry_id: &str) -> Result<Vec<Category>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT c.id, c.name, c.slug, c.sort_order
             FROM categories c
             JOIN entry_categories ec ON ec.category_id = c.id
             WHERE ec.entry_id = ?1
             ORDER BY c.sort_order, c.name",
        )?;
        let categories = stmt
            .query_map(params![entry_id], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                    sort_order: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn insert_submission(&self, new: &NewSubmission) -> Result<Submission> {
        let submission = Submission {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            email: new.email.clone(),
            server_name: new.server_name.clone(),
            repo_url: new.repo_url.clone(),
            description: new.description.clone(),
            status: SubmissionStatus::Pending,
            created_at: Utc::now(),
        };

        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO submissions (id, name, email, server_name, repo_url, description, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                submission.id,
                submission.name,
                submission.email,
                submission.server_name,
                submission.repo_url,
                submission.description,
                submission.status.as_str(),
                format_ts(&submission.created_at),
            ],
        )
        .context("Failed to insert submission")?;
        Ok(submission)
    }

    fn submission_exists_for_repo(&self, repo_url: &str) -> Result<bool> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT 1 FROM submissions WHERE repo_url = ?1")?;
        Ok(stmt
            .query_row(params![repo_url], |_| Ok(()))
            .optional()?
            .is_some())
    }

    fn get_submission(&self, id: &str) -> Result<Option<Submission>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT * FROM submissions WHERE id = ?1")?;
        let submission = stmt
            .query_row(params![id], Self::row_to_submission)
            .optional()?;
        Ok(submission)
    }

    fn list_submissions(&self, status: Option<SubmissionStatus>) -> Result<Vec<Submission>> {
        let conn = self.read_conn.lock().unwrap();
        let submissions = match status {
            Some(status) => {
                let mut stmt = conn.prepare_cached(
                    "SELECT * FROM submissions WHERE status = ?1 ORDER BY created_at DESC",
                )?;
                let rows = stmt
                    .query_map(params![status.as_str()], Self::row_to_submission)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare_cached("SELECT * FROM submissions ORDER BY created_at DESC")?;
                let rows = stmt
                    .query_map([], Self::row_to_submission)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(submissions)
    }

    fn set_submission_status(&self, id: &str, status: SubmissionStatus) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE submissions SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(affected > 0)
    }

    fn record_event_start(&self, event: &str) -> Result<i64> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO event_runs (event, started_at, status, attempts) VALUES (?1, ?2, ?3, 0)",
            params![
                event,
                format_ts(&Utc::now()),
                EventRunStatus::Running.as_str()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn record_event_finish(
        &self,
        run_id: i64,
        status: EventRunStatus,
        attempts: i64,
        error: Option<String>,
    ) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "UPDATE event_runs SET finished_at = ?1, status = ?2, attempts = ?3, error = ?4
             WHERE id = ?5",
            params![
                format_ts(&Utc::now()),
                status.as_str(),
                attempts,
                error,
                run_id
            ],
        )?;
        Ok(())
    }

    fn recent_event_runs(&self, limit: usize) -> Result<Vec<EventRun>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, event, started_at, finished_at, status, attempts, error
             FROM event_runs ORDER BY id DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map(params![limit as i64], |row| {
                let started_at: String = row.get(2)?;
                let status: String = row.get(4)?;
                Ok(EventRun {
                    id: row.get(0)?,
                    event: row.get(1)?,
                    started_at: parse_ts(&started_at),
                    finished_at: parse_ts_opt(row.get(3)?),
                    status: EventRunStatus::parse(&status).unwrap_or(EventRunStatus::Failed),
                    attempts: row.get(5)?,
                    error: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

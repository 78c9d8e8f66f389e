//! SQLite schema for the directory database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnDelete, SqlType, Table, VersionedSchema,
};

const ENTRIES_TABLE_V1: Table = Table {
    name: "entries",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("slug", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("short_desc", SqlType::Text, non_null = true),
        sqlite_column!("long_desc", SqlType::Text),
        sqlite_column!("homepage_url", SqlType::Text),
        sqlite_column!("repo_url", SqlType::Text),
        sqlite_column!("docs_url", SqlType::Text),
        sqlite_column!("logo_url", SqlType::Text),
        sqlite_column!("stars", SqlType::Integer), // NULL = unknown
        sqlite_column!("last_commit", SqlType::Text),
        sqlite_column!("license", SqlType::Text),
        sqlite_column!("readme", SqlType::Text),
        sqlite_column!("created_at", SqlType::Text, non_null = true), // RFC 3339
        sqlite_column!("updated_at", SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_entries_name", "name"),
        ("idx_entries_created_at", "created_at DESC"),
        ("idx_entries_repo_url", "repo_url"),
    ],
    unique_constraints: &[],
};

const CATEGORIES_TABLE_V1: Table = Table {
    name: "categories",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("slug", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("sort_order", SqlType::Integer, non_null = true, default_value = Some("0")),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ENTRY_FK: ForeignKey = ForeignKey {
    foreign_table: "entries",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::Cascade,
};

const CATEGORY_FK: ForeignKey = ForeignKey {
    foreign_table: "categories",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::Cascade,
};

const ENTRY_CATEGORIES_TABLE_V1: Table = Table {
    name: "entry_categories",
    columns: &[
        sqlite_column!("entry_id", SqlType::Text, non_null = true, foreign_key = Some(&ENTRY_FK)),
        sqlite_column!(
            "category_id",
            SqlType::Text,
            non_null = true,
            foreign_key = Some(&CATEGORY_FK)
        ),
    ],
    indices: &[("idx_entry_categories_category", "category_id")],
    unique_constraints: &[&["entry_id", "category_id"]],
};

const SUBMISSIONS_TABLE_V1: Table = Table {
    name: "submissions",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("email", SqlType::Text, non_null = true),
        sqlite_column!("server_name", SqlType::Text, non_null = true),
        sqlite_column!("repo_url", SqlType::Text, non_null = true),
        sqlite_column!("description", SqlType::Text),
        sqlite_column!("status", SqlType::Text, non_null = true, default_value = Some("'pending'")),
        sqlite_column!("created_at", SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_submissions_repo_url", "repo_url"),
        ("idx_submissions_status", "status"),
    ],
    unique_constraints: &[],
};

const EVENT_RUNS_TABLE_V1: Table = Table {
    name: "event_runs",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true), // AUTOINCREMENT
        sqlite_column!("event", SqlType::Text, non_null = true),
        sqlite_column!("started_at", SqlType::Text, non_null = true),
        sqlite_column!("finished_at", SqlType::Text),
        sqlite_column!("status", SqlType::Text, non_null = true),
        sqlite_column!("attempts", SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("error", SqlType::Text),
    ],
    indices: &[("idx_event_runs_started", "started_at DESC")],
    unique_constraints: &[],
};

pub const DIRECTORY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        ENTRIES_TABLE_V1,
        CATEGORIES_TABLE_V1,
        ENTRY_CATEGORIES_TABLE_V1,
        SUBMISSIONS_TABLE_V1,
        EVENT_RUNS_TABLE_V1,
    ],
    migration: None,
}];

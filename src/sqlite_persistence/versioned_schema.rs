//! Declarative SQLite schema definitions with version tracking.
//!
//! Schemas are described as const tables, created in one shot on a fresh
//! database, and validated against `PRAGMA table_info` on every open so a
//! mismatched database fails fast instead of corrupting data later.

use anyhow::{bail, Result};
use rusqlite::{params, Connection};

/// Offset added to schema versions in `PRAGMA user_version` so our databases
/// are distinguishable from files created by unrelated tools.
pub const BASE_DB_VERSION: usize = 77000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut fires when the macro is called without any field overrides
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            "REAL" => Some(SqlType::Real),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyOnDelete {
    Cascade,
    SetNull,
    Restrict,
}

impl ForeignKeyOnDelete {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnDelete::Cascade => "CASCADE",
            ForeignKeyOnDelete::SetNull => "SET NULL",
            ForeignKeyOnDelete::Restrict => "RESTRICT",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnDelete,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'static str>,
    pub foreign_key: Option<&'static ForeignKey>,
}

impl Column {
    fn render(&self, out: &mut String) {
        out.push_str(self.name);
        out.push(' ');
        out.push_str(self.sql_type.as_sql());
        if self.is_primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            out.push_str(" NOT NULL");
        }
        if self.is_unique {
            out.push_str(" UNIQUE");
        }
        if let Some(default_value) = self.default_value {
            out.push_str(" DEFAULT ");
            out.push_str(default_value);
        }
        if let Some(fk) = self.foreign_key {
            out.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                fk.foreign_table,
                fk.foreign_column,
                fk.on_delete.as_sql()
            ));
        }
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// (index name, indexed column expression) pairs.
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut sql = format!("CREATE TABLE {} (", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            column.render(&mut sql);
        }
        for unique in self.unique_constraints {
            sql.push_str(&format!(", UNIQUE ({})", unique.join(", ")));
        }
        sql.push_str(");");
        conn.execute(&sql, params![])?;

        for (index_name, expr) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, expr),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        struct ActualColumn {
            name: String,
            sql_type: Option<SqlType>,
            non_null: bool,
            is_primary_key: bool,
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual: Vec<ActualColumn> = stmt
            .query_map(params![], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    sql_type: SqlType::parse(&row.get::<_, String>(2)?),
                    non_null: row.get::<_, i32>(3)? == 1,
                    is_primary_key: row.get::<_, i32>(5)? != 0,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {} ({})",
                self.name,
                actual.len(),
                self.columns.len(),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {}: expected column {}, found {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != Some(expected.sql_type) {
                bail!(
                    "Table {} column {}: type mismatch (expected {:?})",
                    self.name,
                    expected.name,
                    expected.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {}: NOT NULL mismatch",
                    self.name,
                    expected.name
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {}: PRIMARY KEY mismatch",
                    self.name,
                    expected.name
                );
            }
        }

        for (index_name, _) in self.indices {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

/// Open-or-create helper shared by the stores: creates the latest schema on a
/// fresh database, otherwise validates the version and runs pending
/// migrations inside one transaction.
pub fn open_versioned(conn: &mut Connection, schemas: &[VersionedSchema]) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON;", params![])?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    let latest = schemas.last().expect("at least one schema version");

    if table_count == 0 {
        return latest.create(conn);
    }

    let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 1 {
        bail!("Database has unrecognized version {}", raw_version);
    }

    let current = schemas
        .iter()
        .find(|s| s.version == db_version as usize)
        .ok_or_else(|| anyhow::anyhow!("Unknown database schema version {}", db_version))?;
    current.validate(conn)?;

    if (db_version as usize) < latest.version {
        let tx = conn.transaction()?;
        for schema in schemas.iter().filter(|s| s.version > db_version as usize) {
            if let Some(migrate) = schema.migration {
                migrate(&tx)?;
            }
        }
        tx.pragma_update(None, "user_version", (BASE_DB_VERSION + latest.version) as i64)?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_column;

    const PARENT_TABLE: Table = Table {
        name: "parents",
        columns: &[
            sqlite_column!("id", SqlType::Text, is_primary_key = true),
            sqlite_column!("name", SqlType::Text, non_null = true),
        ],
        indices: &[("idx_parents_name", "name")],
        unique_constraints: &[],
    };

    const CHILD_FK: ForeignKey = ForeignKey {
        foreign_table: "parents",
        foreign_column: "id",
        on_delete: ForeignKeyOnDelete::Cascade,
    };

    const CHILD_TABLE: Table = Table {
        name: "children",
        columns: &[
            sqlite_column!("parent_id", SqlType::Text, non_null = true, foreign_key = Some(&CHILD_FK)),
            sqlite_column!("label", SqlType::Text, non_null = true),
        ],
        indices: &[],
        unique_constraints: &[&["parent_id", "label"]],
    };

    const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
        version: 1,
        tables: &[PARENT_TABLE, CHILD_TABLE],
        migration: None,
    }];

    #[test]
    fn create_and_validate_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS[0].create(&conn).unwrap();
        SCHEMAS[0].validate(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, BASE_DB_VERSION as i64 + 1);
    }

    #[test]
    fn cascade_delete_through_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS[0].create(&conn).unwrap();

        conn.execute("INSERT INTO parents (id, name) VALUES ('p1', 'one')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO children (parent_id, label) VALUES ('p1', 'a')",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM parents WHERE id = 'p1'", []).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM children", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn validate_rejects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE parents (id TEXT PRIMARY KEY)", [])
            .unwrap();

        let err = PARENT_TABLE.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("columns"));
    }

    #[test]
    fn validate_rejects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE parents (id TEXT PRIMARY KEY, name TEXT NOT NULL)",
            [],
        )
        .unwrap();

        let err = PARENT_TABLE.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("missing index"));
    }

    #[test]
    fn open_versioned_creates_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        open_versioned(&mut conn, SCHEMAS).unwrap();
        SCHEMAS[0].validate(&conn).unwrap();

        // A second open validates without error.
        open_versioned(&mut conn, SCHEMAS).unwrap();
    }

    #[test]
    fn open_versioned_rejects_foreign_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE unrelated (x INTEGER)", []).unwrap();

        assert!(open_versioned(&mut conn, SCHEMAS).is_err());
    }
}

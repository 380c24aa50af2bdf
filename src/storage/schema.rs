//! Database schema definitions
//!
//! Natural ids are enforced with UNIQUE / PRIMARY KEY constraints so a second
//! writer fails loudly instead of duplicating rows.

use crate::storage::Table;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Mirrored pages, one row per natural id
CREATE TABLE IF NOT EXISTS page (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    jcr_id TEXT NOT NULL UNIQUE,
    display_name TEXT,
    parent_id TEXT,
    parent_name TEXT,
    is_root INTEGER NOT NULL DEFAULT 0,
    uri TEXT,
    url TEXT,
    creation_date TEXT,
    publish_date TEXT,
    last_modified_date TEXT,
    last_publish_date TEXT,
    html TEXT,
    page_object TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_is_root ON page(is_root);

-- Actors referenced by pages
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    jcr_id TEXT NOT NULL UNIQUE,
    name TEXT,
    mail TEXT
);

-- Role edges, at most one per page and role
CREATE TABLE IF NOT EXISTS created_by (
    page_id INTEGER PRIMARY KEY REFERENCES page(id),
    user_id INTEGER NOT NULL REFERENCES user(id)
);

CREATE TABLE IF NOT EXISTS published_by (
    page_id INTEGER PRIMARY KEY REFERENCES page(id),
    user_id INTEGER NOT NULL REFERENCES user(id)
);

CREATE TABLE IF NOT EXISTS last_modified_by (
    page_id INTEGER PRIMARY KEY REFERENCES page(id),
    user_id INTEGER NOT NULL REFERENCES user(id)
);

CREATE TABLE IF NOT EXISTS last_published_by (
    page_id INTEGER PRIMARY KEY REFERENCES page(id),
    user_id INTEGER NOT NULL REFERENCES user(id)
);

-- Child edges, one parent attribution per child
CREATE TABLE IF NOT EXISTS child (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES page(id),
    parent_jcr_id TEXT NOT NULL,
    child_jcr_id TEXT NOT NULL UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_child_parent ON child(parent_id);

-- Track mirror runs
CREATE TABLE IF NOT EXISTS crawl_run (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    nodes_visited INTEGER NOT NULL DEFAULT 0,
    pages_persisted INTEGER NOT NULL DEFAULT 0,
    pages_without_markup INTEGER NOT NULL DEFAULT 0,
    nodes_skipped INTEGER NOT NULL DEFAULT 0,
    resolve_failures INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Returns the first required table missing from `present`, in schema order
pub fn first_missing_table<'a, I>(present: I) -> Option<Table>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = present.into_iter().collect();
    Table::REQUIRED
        .into_iter()
        .find(|table| !present.contains(&table.name()))
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::api::UserProfile;
use crate::crawler::CrawlStats;
use crate::storage::schema::{first_missing_table, initialize_schema};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    ChildRecord, NewPage, PageRecord, Role, RunRecord, RunStatus, Table, UserRecord,
};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;

const PAGE_COLUMNS: &str = "id, jcr_id, display_name, parent_id, parent_name, is_root, uri, url,
     creation_date, publish_date, last_modified_date, last_publish_date, html, page_object";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, nodes_visited,
     pages_persisted, pages_without_markup, nodes_skipped, resolve_failures";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database and creates any missing tables
    pub fn new(path: &Path) -> StorageResult<Self> {
        let storage = Self::open_existing(path)?;
        initialize_schema(&storage.conn)?;
        Ok(storage)
    }

    /// Opens a database without touching its schema
    pub fn open_existing(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(Self { conn })
    }

    /// Opens an existing database read-only, never creating the file
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        if !path.exists() {
            return Err(StorageError::MissingDatabase(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
        Ok(PageRecord {
            id: row.get(0)?,
            jcr_id: row.get(1)?,
            display_name: row.get(2)?,
            parent_id: row.get(3)?,
            parent_name: row.get(4)?,
            is_root: row.get::<_, i64>(5)? != 0,
            uri: row.get(6)?,
            url: row.get(7)?,
            creation_date: row.get(8)?,
            publish_date: row.get(9)?,
            last_modified_date: row.get(10)?,
            last_publish_date: row.get(11)?,
            html: row.get(12)?,
            page_object: row.get(13)?,
        })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
            stats: CrawlStats {
                nodes_visited: row.get(5)?,
                pages_persisted: row.get(6)?,
                pages_without_markup: row.get(7)?,
                nodes_skipped: row.get(8)?,
                resolve_failures: row.get(9)?,
            },
        })
    }

    fn page_id_by_jcr_id(&self, jcr_id: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM page WHERE jcr_id = ?1",
                params![jcr_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl Storage for SqliteStorage {
    // ===== Schema =====

    fn verify_schema(&self) -> StorageResult<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        if tables.is_empty() {
            return Err(StorageError::NoTables);
        }

        match first_missing_table(tables.iter().map(String::as_str)) {
            Some(table) => Err(StorageError::MissingTable(table.name())),
            None => Ok(()),
        }
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_run (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &CrawlStats,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE crawl_run SET status = ?1, finished_at = ?2, nodes_visited = ?3,
             pages_persisted = ?4, pages_without_markup = ?5, nodes_skipped = ?6,
             resolve_failures = ?7 WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                stats.nodes_visited,
                stats.pages_persisted,
                stats.pages_without_markup,
                stats.nodes_skipped,
                stats.resolve_failures,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM crawl_run ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                [],
                Self::run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Pages =====

    fn upsert_page(&mut self, page: &NewPage) -> StorageResult<i64> {
        if let Some(id) = self.page_id_by_jcr_id(&page.jcr_id)? {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO page (jcr_id, display_name, parent_id, parent_name, is_root, uri, url,
             creation_date, publish_date, last_modified_date, last_publish_date, html, page_object)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                page.jcr_id,
                page.display_name,
                page.parent_id,
                page.parent_name,
                page.is_root as i64,
                page.uri,
                page.url,
                page.creation_date,
                page.publish_date,
                page.last_modified_date,
                page.last_publish_date,
                page.html,
                page.page_object,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_page_by_jcr_id(&self, jcr_id: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM page WHERE jcr_id = ?1", PAGE_COLUMNS),
                params![jcr_id],
                Self::page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn get_root_page(&self) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM page WHERE is_root = 1 ORDER BY id LIMIT 1",
                    PAGE_COLUMNS
                ),
                [],
                Self::page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn list_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM page ORDER BY id", PAGE_COLUMNS))?;

        let pages = stmt
            .query_map([], Self::page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    // ===== Users =====

    fn upsert_user(&mut self, jcr_id: &str, profile: Option<&UserProfile>) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM user WHERE jcr_id = ?1",
                params![jcr_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO user (jcr_id, name, mail) VALUES (?1, ?2, ?3)",
            params![
                jcr_id,
                profile.and_then(|p| p.display_name.as_deref()),
                profile.and_then(|p| p.mail.as_deref()),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_user_by_jcr_id(&self, jcr_id: &str) -> StorageResult<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, jcr_id, name, mail FROM user WHERE jcr_id = ?1",
                params![jcr_id],
                |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        jcr_id: row.get(1)?,
                        name: row.get(2)?,
                        mail: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    // ===== Edges =====

    fn upsert_role_edge(&mut self, role: Role, page_id: i64, user_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (page_id, user_id) VALUES (?1, ?2)",
                role.table().name()
            ),
            params![page_id, user_id],
        )?;
        Ok(inserted > 0)
    }

    fn get_role_user(&self, role: Role, page_id: i64) -> StorageResult<Option<i64>> {
        let user_id = self
            .conn
            .query_row(
                &format!(
                    "SELECT user_id FROM {} WHERE page_id = ?1",
                    role.table().name()
                ),
                params![page_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn upsert_child_edge(
        &mut self,
        parent_page_id: i64,
        parent_jcr_id: &str,
        child_jcr_id: &str,
    ) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO child (parent_id, parent_jcr_id, child_jcr_id) VALUES (?1, ?2, ?3)",
            params![parent_page_id, parent_jcr_id, child_jcr_id],
        )?;
        Ok(inserted > 0)
    }

    fn get_children(&self, parent_page_id: i64) -> StorageResult<Vec<ChildRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT parent_id, parent_jcr_id, child_jcr_id FROM child WHERE parent_id = ?1 ORDER BY id",
        )?;

        let children = stmt
            .query_map(params![parent_page_id], |row| {
                Ok(ChildRecord {
                    parent_id: row.get(0)?,
                    parent_jcr_id: row.get(1)?,
                    child_jcr_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(children)
    }

    // ===== Statistics =====

    fn count_rows(&self, table: Table) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_pages_with_markup(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM page WHERE html IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

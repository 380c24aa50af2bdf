//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::api::UserProfile;
use crate::crawler::CrawlStats;
use crate::storage::{
    ChildRecord, NewPage, PageRecord, Role, RunRecord, RunStatus, Table, UserRecord,
};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database file {} does not exist", .0.display())]
    MissingDatabase(PathBuf),

    #[error("Database tables missing")]
    NoTables,

    #[error("Missing needed table {0}")]
    MissingTable(&'static str),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is an insert-if-absent keyed by a natural id, so calling any
/// of them again with the same key changes nothing.
pub trait Storage {
    // ===== Schema =====

    /// Checks that every required table exists, naming the first one missing
    fn verify_schema(&self) -> StorageResult<()>;

    // ===== Run Management =====

    /// Creates a new run in the `running` state and returns its id
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records the final status and counters of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &CrawlStats)
        -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Pages =====

    /// Inserts a page unless its natural id is already stored
    ///
    /// # Returns
    ///
    /// The internal id of the existing or newly created row. An existing row
    /// is never updated.
    fn upsert_page(&mut self, page: &NewPage) -> StorageResult<i64>;

    /// Gets a page by natural id
    fn get_page_by_jcr_id(&self, jcr_id: &str) -> StorageResult<Option<PageRecord>>;

    /// Gets the page flagged as root
    fn get_root_page(&self) -> StorageResult<Option<PageRecord>>;

    /// Lists all pages in insertion order
    fn list_pages(&self) -> StorageResult<Vec<PageRecord>>;

    // ===== Users =====

    /// Inserts a user unless its natural id is already stored
    ///
    /// Name and mail are only written on first insert and stay null when no
    /// profile is available.
    fn upsert_user(&mut self, jcr_id: &str, profile: Option<&UserProfile>) -> StorageResult<i64>;

    /// Gets a user by natural id
    fn get_user_by_jcr_id(&self, jcr_id: &str) -> StorageResult<Option<UserRecord>>;

    // ===== Edges =====

    /// Links a page to a user for a role unless the page already has that role
    ///
    /// Returns true when a new edge was written.
    fn upsert_role_edge(&mut self, role: Role, page_id: i64, user_id: i64) -> StorageResult<bool>;

    /// Gets the user holding a role on a page
    fn get_role_user(&self, role: Role, page_id: i64) -> StorageResult<Option<i64>>;

    /// Records a child edge unless the child already has one
    ///
    /// Returns true when a new edge was written.
    fn upsert_child_edge(
        &mut self,
        parent_page_id: i64,
        parent_jcr_id: &str,
        child_jcr_id: &str,
    ) -> StorageResult<bool>;

    /// Gets all child edges of a page in insertion order
    fn get_children(&self, parent_page_id: i64) -> StorageResult<Vec<ChildRecord>>;

    // ===== Statistics =====

    /// Counts the rows of a table
    fn count_rows(&self, table: Table) -> StorageResult<u64>;

    /// Counts pages stored with markup
    fn count_pages_with_markup(&self) -> StorageResult<u64>;
}

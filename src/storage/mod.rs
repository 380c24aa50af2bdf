//! Storage module for persisting mirrored content
//!
//! This module handles all database operations for the mirror, including:
//! - SQLite database initialization and schema verification
//! - Idempotent page, user, role edge and child edge writes
//! - Run tracking
//! - The `record_entry` entry point that maps a resolved node onto rows

mod entry;
mod schema;
mod sqlite;
mod traits;

pub use entry::{format_timestamp, record_entry};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::SyncError;
use std::path::Path;

/// Opens a storage database, creating missing tables when asked to
///
/// The required tables are verified either way.
pub fn open_storage(path: &Path, create_schema: bool) -> Result<SqliteStorage, SyncError> {
    let storage = if create_schema {
        SqliteStorage::new(path)?
    } else {
        SqliteStorage::open_existing(path)?
    };
    storage.verify_schema()?;
    Ok(storage)
}

/// Checks a database's schema without creating or changing anything
pub fn inspect_storage(path: &Path) -> Result<SqliteStorage, SyncError> {
    let storage = SqliteStorage::open_read_only(path)?;
    storage.verify_schema()?;
    Ok(storage)
}

/// Tables the mirror writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Child,
    CreatedBy,
    LastModifiedBy,
    LastPublishedBy,
    Page,
    PublishedBy,
    User,
}

impl Table {
    /// Tables that must exist before a run starts
    pub const REQUIRED: [Table; 7] = [
        Table::Child,
        Table::CreatedBy,
        Table::LastModifiedBy,
        Table::LastPublishedBy,
        Table::Page,
        Table::PublishedBy,
        Table::User,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::CreatedBy => "created_by",
            Self::LastModifiedBy => "last_modified_by",
            Self::LastPublishedBy => "last_published_by",
            Self::Page => "page",
            Self::PublishedBy => "published_by",
            Self::User => "user",
        }
    }
}

/// Roles a user can hold on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    CreatedBy,
    PublishedBy,
    LastModifiedBy,
    LastPublishedBy,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::CreatedBy,
        Role::PublishedBy,
        Role::LastModifiedBy,
        Role::LastPublishedBy,
    ];

    /// Edge table backing this role
    pub fn table(&self) -> Table {
        match self {
            Self::CreatedBy => Table::CreatedBy,
            Self::PublishedBy => Table::PublishedBy,
            Self::LastModifiedBy => Table::LastModifiedBy,
            Self::LastPublishedBy => Table::LastPublishedBy,
        }
    }
}

/// Page attributes written on first insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPage {
    pub jcr_id: String,
    pub display_name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_name: Option<String>,
    pub is_root: bool,
    pub uri: Option<String>,
    pub url: Option<String>,
    pub creation_date: Option<String>,
    pub publish_date: Option<String>,
    pub last_modified_date: Option<String>,
    pub last_publish_date: Option<String>,
    pub html: Option<String>,
    pub page_object: String,
}

/// Represents a page in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: i64,
    pub jcr_id: String,
    pub display_name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_name: Option<String>,
    pub is_root: bool,
    pub uri: Option<String>,
    pub url: Option<String>,
    pub creation_date: Option<String>,
    pub publish_date: Option<String>,
    pub last_modified_date: Option<String>,
    pub last_publish_date: Option<String>,
    pub html: Option<String>,
    pub page_object: String,
}

/// Represents a user in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub jcr_id: String,
    pub name: Option<String>,
    pub mail: Option<String>,
}

/// Represents a child edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub parent_id: i64,
    pub parent_jcr_id: String,
    pub child_jcr_id: String,
}

/// Represents a mirror run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub stats: crate::crawler::CrawlStats,
}

/// Status of a mirror run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

//! SiteVision Mirror: a resumable content tree mirror
//!
//! This crate walks a remote SiteVision-style content tree depth first,
//! checkpointing its exact position after every node, and stores each visited
//! page with its actors and child edges in SQLite without ever duplicating rows.

pub mod api;
pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for mirror operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Root listing returned no nodes")]
    EmptyRoot,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, CrawlStats, Crawler};
pub use state::{FrontierGroup, ParentContext, RemoteNodeRef, TraversalState};

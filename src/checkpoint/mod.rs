//! Checkpoint module for resumable traversal
//!
//! The traversal position (frontier + ancestor stack) is written after every
//! frontier mutation so an interrupted run resumes exactly where it stopped.

mod file;

pub use file::FileCheckpointStore;

use crate::state::TraversalState;
use thiserror::Error;

/// Errors that can occur while reading or writing checkpoints
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error on checkpoint {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Corrupt checkpoint {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Durable storage for the traversal position
pub trait CheckpointStore {
    /// Loads the last saved position
    ///
    /// Returns `Ok(None)` when no checkpoint exists yet. A checkpoint that
    /// cannot be read back into a valid `TraversalState` is an error.
    fn load(&self) -> CheckpointResult<Option<TraversalState>>;

    /// Replaces the saved position
    ///
    /// Implementations must never leave a partially written checkpoint
    /// visible to the next `load`.
    fn save(&mut self, state: &TraversalState) -> CheckpointResult<()>;

    /// Removes any saved position
    fn clear(&mut self) -> CheckpointResult<()>;
}

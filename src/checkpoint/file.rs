//! JSON file checkpoint store
//!
//! Both stacks live in one document with two named slots, `frontier` and
//! `ancestors`, so a single rename swaps them together.

use crate::checkpoint::{CheckpointError, CheckpointResult, CheckpointStore};
use crate::state::{FrontierGroup, ParentContext, TraversalState};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CheckpointDocument {
    frontier: Vec<FrontierGroup>,
    ancestors: Vec<ParentContext>,
}

/// Checkpoint store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    fn write_atomic(&self, bytes: &[u8]) -> CheckpointResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
            }
        }

        let tmp = self.temp_path();
        let mut file = File::create(&tmp).map_err(|e| self.io_error(&tmp, e))?;
        file.write_all(bytes).map_err(|e| self.io_error(&tmp, e))?;
        file.sync_all().map_err(|e| self.io_error(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        Ok(())
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> CheckpointResult<Option<TraversalState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let document: CheckpointDocument =
            serde_json::from_slice(&bytes).map_err(|e| CheckpointError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        let state = TraversalState::from_parts(document.frontier, document.ancestors)
            .map_err(|message| CheckpointError::Corrupt {
                path: self.path.display().to_string(),
                message,
            })?;

        tracing::debug!(
            "Loaded checkpoint from {} ({} levels, {} queued nodes)",
            self.path.display(),
            state.depth(),
            state.remaining()
        );

        Ok(Some(state))
    }

    fn save(&mut self, state: &TraversalState) -> CheckpointResult<()> {
        let bytes = serde_json::to_vec(state)?;
        self.write_atomic(&bytes)
    }

    fn clear(&mut self) -> CheckpointResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RemoteNodeRef;
    use tempfile::TempDir;

    fn sample_state() -> TraversalState {
        let mut state = TraversalState::seeded(vec![
            RemoteNodeRef::new("4.a", "About"),
            RemoteNodeRef::new("4.b", "Blog"),
        ]);
        let (about, _) = state.next_node().unwrap();
        state.push_children(
            ParentContext::new(&about.id, "About us"),
            vec![
                RemoteNodeRef::new("4.c", "Contact"),
                RemoteNodeRef::new("4.d", "Staff"),
            ],
        );
        state
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("files/checkpoint.json"));
        let state = sample_state();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, state);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));

        let mut state = sample_state();
        store.save(&state).unwrap();
        state.next_node().unwrap();
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), state);
    }

    #[test]
    fn test_empty_state_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));

        store.save(&TraversalState::default()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_stale_temp_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));
        let state = sample_state();
        store.save(&state).unwrap();

        // A crash mid-write leaves only the temp file behind
        fs::write(store.temp_path(), b"{\"frontier\": [[").unwrap();

        assert_eq!(store.load().unwrap().unwrap(), state);
    }

    #[test]
    fn test_unparsable_checkpoint_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, b"not json").unwrap();

        let store = FileCheckpointStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(CheckpointError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_unpaired_stacks_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        fs::write(
            &path,
            br#"{"frontier": [], "ancestors": [{"id": "4.a", "name": "About"}]}"#,
        )
        .unwrap();

        let store = FileCheckpointStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(CheckpointError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));
        store.save(&sample_state()).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        // Clearing twice is fine
        store.clear().unwrap();
    }
}

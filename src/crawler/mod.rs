//! Crawler module for walking the remote content tree
//!
//! This module contains the core mirroring logic, including:
//! - Content resolution with bounded raw properties retries
//! - The preorder traversal loop with per-node checkpoints
//! - Run counters

mod backoff;
mod coordinator;
mod resolver;
mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::ExponentialBackoff;
pub use coordinator::{CrawlOutcome, Crawler};
pub use resolver::{ContentResolver, ResolveError, ResolvedContent, UnrenderedReason};
pub use stats::CrawlStats;

use crate::api::SiteVisionClient;
use crate::checkpoint::{CheckpointStore, FileCheckpointStore};
use crate::config::Config;
use crate::storage::open_storage;
use crate::SyncError;
use std::path::Path;
use tokio::sync::watch;

/// Result of a run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorReport {
    pub outcome: CrawlOutcome,
    pub stats: CrawlStats,
}

/// Runs or resumes a complete mirror
///
/// This is the main entry point for mirroring. It will:
/// 1. Open the database and verify its schema
/// 2. Build the API client
/// 3. Clear the checkpoint when `fresh` is set
/// 4. Resume from the checkpoint or seed from the root listing
/// 5. Walk the tree until it is exhausted or `shutdown` reads `true`
///
/// # Arguments
///
/// * `config` - The mirror configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
/// * `fresh` - Whether to discard the saved traversal position
/// * `shutdown` - Stop signal, checked between nodes
///
/// # Returns
///
/// * `Ok(MirrorReport)` - The run completed or was interrupted cleanly
/// * `Err(SyncError)` - Startup or persistence failed
///
/// # Example
///
/// ```no_run
/// use sitevision_mirror::config::load_config_with_hash;
/// use sitevision_mirror::crawler::run_mirror;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("mirror.toml"))?;
/// let (_tx, rx) = tokio::sync::watch::channel(false);
/// let report = run_mirror(&config, &hash, false, rx).await?;
/// println!("{}", report.stats);
/// # Ok(())
/// # }
/// ```
pub async fn run_mirror(
    config: &Config,
    config_hash: &str,
    fresh: bool,
    shutdown: watch::Receiver<bool>,
) -> Result<MirrorReport, SyncError> {
    let storage = open_storage(
        Path::new(&config.database.path),
        config.database.create_schema,
    )?;
    let api = SiteVisionClient::new(&config.api)?;

    let mut checkpoint = FileCheckpointStore::new(&config.checkpoint.path);
    if fresh {
        tracing::info!("Clearing checkpoint {}", checkpoint.path().display());
        checkpoint.clear()?;
    }

    let mut crawler =
        Crawler::new(api, storage, checkpoint, &config.crawler, config_hash).with_shutdown(shutdown);
    let outcome = crawler.run().await?;

    Ok(MirrorReport {
        outcome,
        stats: *crawler.stats(),
    })
}

//! Crawler coordinator - main traversal loop
//!
//! This module contains the loop that walks the remote tree, including:
//! - Loading the checkpoint or seeding the frontier from the root listing
//! - Visiting one node at a time in preorder
//! - Delegating to the content resolver and the persistence layer
//! - Saving the checkpoint after every frontier mutation
//! - Honoring stop requests between nodes

use crate::api::TreeApi;
use crate::checkpoint::CheckpointStore;
use crate::config::CrawlerConfig;
use crate::crawler::resolver::{ContentResolver, ResolvedContent};
use crate::crawler::CrawlStats;
use crate::state::{ParentContext, RemoteNodeRef, TraversalState};
use crate::storage::{record_entry, RunStatus, Storage};
use crate::SyncError;
use std::collections::HashSet;
use tokio::sync::watch;

/// How a run ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The frontier was exhausted
    Completed,
    /// A stop was requested; the checkpoint holds the remaining work
    Interrupted,
}

/// Single-worker traversal engine
///
/// Owns the remote API, the storage backend and the checkpoint store for the
/// duration of a run. The traversal state itself lives only inside `run`.
pub struct Crawler<A, S, C> {
    api: A,
    storage: S,
    checkpoint: C,
    resolver: ContentResolver,
    skip_names: HashSet<String>,
    config_hash: String,
    shutdown: Option<watch::Receiver<bool>>,
    stats: CrawlStats,
}

impl<A, S, C> Crawler<A, S, C>
where
    A: TreeApi,
    S: Storage,
    C: CheckpointStore,
{
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `api` - The remote tree
    /// * `storage` - The storage backend, with a verified schema
    /// * `checkpoint` - Where the traversal position is kept
    /// * `config` - Skip list and retry settings
    /// * `config_hash` - Recorded with the run
    pub fn new(
        api: A,
        storage: S,
        checkpoint: C,
        config: &CrawlerConfig,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            api,
            storage,
            checkpoint,
            resolver: ContentResolver::from_config(config),
            skip_names: config.skip_names.iter().cloned().collect(),
            config_hash: config_hash.into(),
            shutdown: None,
            stats: CrawlStats::default(),
        }
    }

    /// Stops the run at the next node boundary once the channel reads `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn checkpoint(&self) -> &C {
        &self.checkpoint
    }

    /// Runs the traversal until the frontier is empty or a stop is requested
    ///
    /// A persistence failure ends the run with an error. The checkpoint then
    /// still points at the failed node, so the next run retries it.
    pub async fn run(&mut self) -> Result<CrawlOutcome, SyncError> {
        let mut state = self.load_or_seed().await?;
        let run_id = self.storage.create_run(&self.config_hash)?;

        tracing::info!(
            "Starting mirror run {} ({} nodes queued in {} levels)",
            run_id,
            state.remaining(),
            state.depth()
        );

        loop {
            if self.stop_requested() {
                tracing::info!("Stop requested, mirror interrupted: {}", self.stats);
                self.storage
                    .finish_run(run_id, RunStatus::Interrupted, &self.stats)?;
                return Ok(CrawlOutcome::Interrupted);
            }

            let Some((node, parent)) = state.next_node() else {
                break;
            };
            self.stats.nodes_visited += 1;

            if self.skip_names.contains(&node.name) {
                tracing::debug!("Skipping {} ({})", node.name, node.id);
                self.stats.nodes_skipped += 1;
                self.save_checkpoint(&state);
                continue;
            }

            if let Err(e) = self.visit(&mut state, node, parent).await {
                tracing::error!("Mirror aborted: {}", e);
                tracing::error!("Counters at abort: {}", self.stats);
                if let Err(finish_error) =
                    self.storage
                        .finish_run(run_id, RunStatus::Failed, &self.stats)
                {
                    tracing::warn!("Failed to record run failure: {}", finish_error);
                }
                return Err(e);
            }

            self.save_checkpoint(&state);
        }

        self.storage
            .finish_run(run_id, RunStatus::Completed, &self.stats)?;
        tracing::info!("Mirror completed: {}", self.stats);

        Ok(CrawlOutcome::Completed)
    }

    /// Visits one node: lists, resolves, opens its child level and persists it
    async fn visit(
        &mut self,
        state: &mut TraversalState,
        node: RemoteNodeRef,
        parent: ParentContext,
    ) -> Result<(), SyncError> {
        tracing::info!("Current node: {} ({})", node.name, node.id);

        let children = self.api.list_children(&node.id).await;
        let linked: Vec<RemoteNodeRef> = children
            .iter()
            .filter(|child| !self.skip_names.contains(&child.name))
            .cloned()
            .collect();

        let content = match self.resolver.resolve(&self.api, &node, linked).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("{}, nothing stored for {}", e, node.name);
                self.stats.resolve_failures += 1;
                state.push_children(ParentContext::new(&node.id, &node.name), children);
                return Ok(());
            }
        };

        let parent_name = content.display_name().unwrap_or(node.name.as_str()).to_string();
        state.push_children(ParentContext::new(&node.id, parent_name), children);

        record_entry(&self.api, &mut self.storage, &content, &parent).await?;
        self.stats.pages_persisted += 1;

        match &content {
            ResolvedContent::Rendered { .. } => {}
            ResolvedContent::Unrendered { reason, .. } => {
                tracing::debug!("Stored {} without markup: {}", node.id, reason);
                self.stats.pages_without_markup += 1;
            }
            ResolvedContent::RawProperties { .. } => {
                tracing::debug!("Stored {} from raw properties", node.id);
                self.stats.pages_without_markup += 1;
            }
        }

        Ok(())
    }

    async fn load_or_seed(&mut self) -> Result<TraversalState, SyncError> {
        if let Some(state) = self.checkpoint.load()? {
            if !state.is_empty() {
                tracing::info!(
                    "Resuming from checkpoint: {} nodes queued in {} levels",
                    state.remaining(),
                    state.depth()
                );
                return Ok(state);
            }
            tracing::info!("Checkpoint is empty, starting from the root listing");
        }

        let root_group = self.api.root_listing().await;
        if root_group.is_empty() {
            return Err(SyncError::EmptyRoot);
        }

        let state = TraversalState::seeded(root_group);
        self.save_checkpoint(&state);
        Ok(state)
    }

    fn save_checkpoint(&mut self, state: &TraversalState) {
        if let Err(e) = self.checkpoint.save(state) {
            tracing::warn!("Failed to save checkpoint: {}", e);
        }
    }

    fn stop_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}

//! Remote content tree API
//!
//! This module defines the collaborator the traversal needs from the remote
//! system:
//! - listing a node's children
//! - fetching a node's rendered (headless) payload
//! - fetching a node's raw properties
//! - fetching page markup by URL
//!
//! Retrievals other than markup degrade to "absent" on failure; the caller
//! decides how to proceed.

mod client;
mod types;

pub use client::{build_http_client, SiteVisionClient};
pub use types::{ActorRef, PagePayload, PageProperties, UserProfile};

use crate::state::RemoteNodeRef;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while setting up the API client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid API URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Markup could not be fetched
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch markup from {url}: {message}")]
pub struct MarkupError {
    pub url: String,
    /// HTTP status when the server answered with a non-2xx code
    pub status: Option<u16>,
    pub message: String,
}

/// Operations the traversal needs from the remote tree
#[async_trait]
pub trait TreeApi: Send + Sync {
    /// Children of a node, empty on any failure
    async fn list_children(&self, node_id: &str) -> Vec<RemoteNodeRef>;

    /// Children of the configured root URI; the initial frontier group
    async fn root_listing(&self) -> Vec<RemoteNodeRef>;

    /// Rendered payload of a node, `None` on any failure
    async fn fetch_rendered(&self, node_id: &str) -> Option<PagePayload>;

    /// Raw property payload of a node, `None` on failure or an empty answer
    async fn fetch_raw_properties(&self, node_id: &str) -> Option<PagePayload>;

    /// Page markup at `url`
    async fn fetch_markup(&self, url: &str) -> Result<String, MarkupError>;

    /// Whether `natural_id` is the first node of the root listing
    ///
    /// Recomputed on every call.
    async fn is_root_node(&self, natural_id: &str) -> bool {
        self.root_listing()
            .await
            .first()
            .map(|node| node.id == natural_id)
            .unwrap_or(false)
    }
}

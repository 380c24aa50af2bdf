//! Content resolution for a single visited node
//!
//! A node resolves to one of three outcomes: a rendered page with markup, a
//! rendered page stored without markup, or the raw properties fallback used
//! when no rendered payload exists.

use crate::api::{MarkupError, PagePayload, TreeApi};
use crate::config::CrawlerConfig;
use crate::crawler::backoff::ExponentialBackoff;
use crate::state::RemoteNodeRef;
use std::fmt;
use thiserror::Error;

/// Why a rendered page is stored without markup
#[derive(Debug, Clone)]
pub enum UnrenderedReason {
    NotPublished,
    MarkupFailed(MarkupError),
}

impl fmt::Display for UnrenderedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPublished => write!(f, "not published"),
            Self::MarkupFailed(e) => match e.status {
                Some(status) => write!(f, "markup fetch failed with HTTP {}", status),
                None => write!(f, "markup fetch failed: {}", e.message),
            },
        }
    }
}

/// Outcome of resolving a node
#[derive(Debug, Clone)]
pub enum ResolvedContent {
    Rendered {
        payload: PagePayload,
        html: String,
        children: Vec<RemoteNodeRef>,
    },
    Unrendered {
        payload: PagePayload,
        reason: UnrenderedReason,
        children: Vec<RemoteNodeRef>,
    },
    RawProperties {
        payload: PagePayload,
        children: Vec<RemoteNodeRef>,
    },
}

impl ResolvedContent {
    pub fn payload(&self) -> &PagePayload {
        match self {
            Self::Rendered { payload, .. }
            | Self::Unrendered { payload, .. }
            | Self::RawProperties { payload, .. } => payload,
        }
    }

    pub fn children(&self) -> &[RemoteNodeRef] {
        match self {
            Self::Rendered { children, .. }
            | Self::Unrendered { children, .. }
            | Self::RawProperties { children, .. } => children,
        }
    }

    /// Markup to persist, only present for rendered pages
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Rendered { html, .. } => Some(html),
            Self::Unrendered { .. } | Self::RawProperties { .. } => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.payload().properties.display_name.as_deref()
    }
}

/// A node for which no payload could be obtained
#[derive(Debug, Error)]
#[error("No properties for node {node_id} after {attempts} attempts")]
pub struct ResolveError {
    pub node_id: String,
    pub attempts: u32,
}

/// Chooses a retrieval strategy for each node
#[derive(Debug, Clone)]
pub struct ContentResolver {
    max_attempts: u32,
    backoff: ExponentialBackoff,
}

impl ContentResolver {
    pub fn new(max_attempts: u32, backoff: ExponentialBackoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.properties_max_attempts,
            ExponentialBackoff::new(
                config.properties_backoff_ms,
                config.properties_backoff_max_ms,
            ),
        )
    }

    /// Resolves `node`, whose children were already listed
    ///
    /// Falls back to raw properties when no rendered payload with a `URL`
    /// exists, retrying up to the configured number of attempts.
    pub async fn resolve<A: TreeApi + ?Sized>(
        &self,
        api: &A,
        node: &RemoteNodeRef,
        children: Vec<RemoteNodeRef>,
    ) -> Result<ResolvedContent, ResolveError> {
        match api.fetch_rendered(&node.id).await {
            Some(payload) => match payload.properties.url.clone() {
                Some(url) => {
                    return Ok(self.resolve_rendered(api, payload, &url, children).await);
                }
                None => {
                    tracing::debug!(
                        "Rendered payload for {} has no URL, using raw properties",
                        node.id
                    );
                }
            },
            None => {
                tracing::debug!("No rendered payload for {}, using raw properties", node.id);
            }
        }

        let payload = self.fetch_properties_with_retry(api, &node.id).await?;
        Ok(ResolvedContent::RawProperties { payload, children })
    }

    async fn resolve_rendered<A: TreeApi + ?Sized>(
        &self,
        api: &A,
        payload: PagePayload,
        url: &str,
        children: Vec<RemoteNodeRef>,
    ) -> ResolvedContent {
        if !payload.properties.is_published() {
            return ResolvedContent::Unrendered {
                payload,
                reason: UnrenderedReason::NotPublished,
                children,
            };
        }

        match api.fetch_markup(url).await {
            Ok(html) => ResolvedContent::Rendered {
                payload,
                html,
                children,
            },
            Err(e) => {
                tracing::warn!("{}", e);
                ResolvedContent::Unrendered {
                    payload,
                    reason: UnrenderedReason::MarkupFailed(e),
                    children,
                }
            }
        }
    }

    async fn fetch_properties_with_retry<A: TreeApi + ?Sized>(
        &self,
        api: &A,
        node_id: &str,
    ) -> Result<PagePayload, ResolveError> {
        for attempt in 0..self.max_attempts {
            if let Some(payload) = api.fetch_raw_properties(node_id).await {
                return Ok(payload);
            }

            if attempt + 1 < self.max_attempts {
                let delay = self.backoff.delay(attempt);
                tracing::debug!(
                    "Properties for {} unavailable (attempt {}/{}), retrying in {:?}",
                    node_id,
                    attempt + 1,
                    self.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(ResolveError {
            node_id: node_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}

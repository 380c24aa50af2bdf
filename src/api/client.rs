//! HTTP client for the SiteVision REST API
//!
//! This module handles all HTTP requests for the mirror, including:
//! - Building the HTTP client with user agent, timeouts and credentials
//! - Node listing, headless and properties endpoints
//! - Unauthenticated page markup fetches
//! - Degrading failed retrievals to empty results

use crate::api::{ApiError, MarkupError, PagePayload, TreeApi};
use crate::config::ApiConfig;
use crate::state::RemoteNodeRef;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// REST client for a SiteVision-style node API
#[derive(Debug, Clone)]
pub struct SiteVisionClient {
    client: Client,
    base_url: String,
    root_uri: String,
    credentials: Option<(String, Option<String>)>,
}

impl SiteVisionClient {
    /// Creates a client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let client = build_http_client(config)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            root_uri: config.root_uri.clone(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    fn endpoint(&self, node_id: &str, resource: &str) -> String {
        format!("{}{}/{}", self.base_url, node_id, resource)
    }

    /// GETs an API endpoint, with credentials when configured
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_ref()),
            None => request,
        }
    }

    /// GETs a JSON document, `None` on any failure
    async fn get_json(&self, url: &str) -> Option<Value> {
        let response = match self.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Request to {} failed: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Request to {} returned HTTP {}", url, status.as_u16());
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Invalid JSON from {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl TreeApi for SiteVisionClient {
    async fn list_children(&self, node_id: &str) -> Vec<RemoteNodeRef> {
        let url = self.endpoint(node_id, "nodes");
        let Some(value) = self.get_json(&url).await else {
            return Vec::new();
        };

        match serde_json::from_value::<Vec<RemoteNodeRef>>(value) {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::debug!("Unexpected node listing from {}: {}", url, e);
                Vec::new()
            }
        }
    }

    async fn root_listing(&self) -> Vec<RemoteNodeRef> {
        self.list_children(&self.root_uri).await
    }

    async fn fetch_rendered(&self, node_id: &str) -> Option<PagePayload> {
        let url = self.endpoint(node_id, "headless");
        let value = self.get_json(&url).await?;

        match PagePayload::from_rendered(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!("Unusable headless payload from {}: {}", url, e);
                None
            }
        }
    }

    async fn fetch_raw_properties(&self, node_id: &str) -> Option<PagePayload> {
        let url = self.endpoint(node_id, "properties");
        let value = self.get_json(&url).await?;

        let is_empty = value.as_object().map(|o| o.is_empty()).unwrap_or(true);
        if is_empty {
            tracing::debug!("Empty properties payload from {}", url);
            return None;
        }

        match PagePayload::from_raw_properties(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!("Unusable properties payload from {}: {}", url, e);
                None
            }
        }
    }

    async fn fetch_markup(&self, url: &str) -> Result<String, MarkupError> {
        // Page URLs may point anywhere, so no credentials
        let response = self.client.get(url).send().await.map_err(|e| MarkupError {
            url: url.to_string(),
            status: e.status().map(|s| s.as_u16()),
            message: if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarkupError {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        response.text().await.map_err(|e| MarkupError {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: e.to_string(),
        })
    }
}

//! In-memory remote tree used by unit tests

use crate::api::{MarkupError, PagePayload, TreeApi};
use crate::state::RemoteNodeRef;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeTree {
    root_uri: String,
    children: HashMap<String, Vec<RemoteNodeRef>>,
    rendered: HashMap<String, Value>,
    properties: HashMap<String, (u32, Value)>,
    markup_failures: HashMap<String, u16>,
    markup_log: Mutex<Vec<String>>,
    properties_log: Mutex<HashMap<String, u32>>,
    listing_log: Mutex<Vec<String>>,
}

impl FakeTree {
    pub fn new(root_uri: &str) -> Self {
        Self {
            root_uri: root_uri.to_string(),
            ..Default::default()
        }
    }

    /// Adds a published page with a URL under `parent`
    pub fn with_page(self, parent: &str, id: &str, name: &str) -> Self {
        self.with_child(parent, id, name).with_rendered(
            id,
            json!({
                "jcr:uuid": id,
                "displayName": name,
                "URL": format!("https://x/{}", id),
            }),
        )
    }

    /// Lists `id` under `parent` without giving it any payload
    pub fn with_child(mut self, parent: &str, id: &str, name: &str) -> Self {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(RemoteNodeRef::new(id, name));
        self
    }

    pub fn with_rendered(mut self, id: &str, properties: Value) -> Self {
        self.rendered.insert(
            id.to_string(),
            json!({"properties": properties, "nodes": [], "contentNodes": []}),
        );
        self
    }

    /// Answers raw properties only after `failures` empty answers
    pub fn with_properties_after(mut self, id: &str, failures: u32, properties: Value) -> Self {
        self.properties
            .insert(id.to_string(), (failures, properties));
        self
    }

    pub fn with_markup_failure(mut self, url: &str, status: u16) -> Self {
        self.markup_failures.insert(url.to_string(), status);
        self
    }

    pub fn markup_requests(&self) -> Vec<String> {
        self.markup_log.lock().unwrap().clone()
    }

    pub fn properties_requests(&self, id: &str) -> u32 {
        self.properties_log
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Node ids whose children were listed, root listings excluded
    pub fn listed(&self) -> Vec<String> {
        self.listing_log
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id != self.root_uri)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TreeApi for FakeTree {
    async fn list_children(&self, node_id: &str) -> Vec<RemoteNodeRef> {
        self.listing_log.lock().unwrap().push(node_id.to_string());
        self.children.get(node_id).cloned().unwrap_or_default()
    }

    async fn root_listing(&self) -> Vec<RemoteNodeRef> {
        self.list_children(&self.root_uri).await
    }

    async fn fetch_rendered(&self, node_id: &str) -> Option<PagePayload> {
        let document = self.rendered.get(node_id)?.clone();
        PagePayload::from_rendered(document).ok()
    }

    async fn fetch_raw_properties(&self, node_id: &str) -> Option<PagePayload> {
        let attempt = {
            let mut log = self.properties_log.lock().unwrap();
            let count = log.entry(node_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let (failures, properties) = self.properties.get(node_id)?;
        if attempt <= *failures {
            return None;
        }
        PagePayload::from_raw_properties(properties.clone()).ok()
    }

    async fn fetch_markup(&self, url: &str) -> Result<String, MarkupError> {
        self.markup_log.lock().unwrap().push(url.to_string());

        if let Some(status) = self.markup_failures.get(url) {
            return Err(MarkupError {
                url: url.to_string(),
                status: Some(*status),
                message: format!("HTTP {}", status),
            });
        }

        let page = url.rsplit('/').next().unwrap_or_default();
        Ok(format!("<html>{}</html>", page))
    }
}

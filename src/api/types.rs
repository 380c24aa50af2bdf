//! Payload types returned by the remote API

use serde::Deserialize;
use serde_json::{json, Value};

/// Profile attached to an actor reference in rendered payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub mail: Option<String>,
}

/// Reference to the user behind one of a page's roles
///
/// Rendered payloads carry `{id, properties}` objects, raw property payloads
/// only the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ActorRef {
    Profile {
        id: String,
        #[serde(default)]
        properties: Option<UserProfile>,
    },
    Id(String),
}

impl ActorRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Profile { id, .. } => id,
            Self::Id(id) => id,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Profile { properties, .. } => properties.as_ref(),
            Self::Id(_) => None,
        }
    }
}

/// Page properties shared by rendered and raw property payloads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "jcr:uuid")]
    pub jcr_id: String,

    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    #[serde(rename = "URI", default)]
    pub uri: Option<String>,

    #[serde(rename = "URL", default)]
    pub url: Option<String>,

    #[serde(default)]
    pub published: Option<bool>,

    // Timestamps are epoch milliseconds
    #[serde(rename = "creationDate", default)]
    pub creation_date: Option<i64>,

    #[serde(rename = "publishDate", default)]
    pub publish_date: Option<i64>,

    #[serde(rename = "lastModifiedDate", default)]
    pub last_modified_date: Option<i64>,

    #[serde(rename = "lastPublishDate", default)]
    pub last_publish_date: Option<i64>,

    #[serde(rename = "createdBy", default)]
    pub created_by: Option<ActorRef>,

    #[serde(rename = "publishedBy", default)]
    pub published_by: Option<ActorRef>,

    #[serde(rename = "lastModifiedBy", default)]
    pub last_modified_by: Option<ActorRef>,

    #[serde(rename = "lastPublishedBy", default)]
    pub last_published_by: Option<ActorRef>,
}

impl PageProperties {
    /// A missing flag counts as published
    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(true)
    }
}

/// Parsed page properties together with the document they came from
#[derive(Debug, Clone, PartialEq)]
pub struct PagePayload {
    pub properties: PageProperties,
    /// Original payload, persisted verbatim
    pub document: Value,
}

impl PagePayload {
    /// Parses a rendered (headless) document: `{properties, nodes, contentNodes}`
    pub fn from_rendered(document: Value) -> Result<Self, serde_json::Error> {
        let properties = serde_json::from_value(document["properties"].clone())?;
        Ok(Self {
            properties,
            document,
        })
    }

    /// Parses a raw properties object, wrapping it the way rendered documents look
    pub fn from_raw_properties(properties: Value) -> Result<Self, serde_json::Error> {
        let parsed = serde_json::from_value(properties.clone())?;
        Ok(Self {
            properties: parsed,
            document: json!({
                "properties": properties,
                "nodes": [],
                "contentNodes": [],
            }),
        })
    }
}

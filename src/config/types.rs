use serde::Deserialize;

/// Main configuration structure for the mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub checkpoint: CheckpointConfig,
    pub database: DatabaseConfig,
}

/// Remote content API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, node ids are appended to it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Node whose children form the initial root group
    #[serde(rename = "root-uri")]
    pub root_uri: String,

    /// Optional basic auth user name
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Node names that are never fetched nor persisted
    #[serde(rename = "skip-names", default = "default_skip_names")]
    pub skip_names: Vec<String>,

    /// Attempts made at the raw properties endpoint before giving up on a node
    #[serde(
        rename = "properties-max-attempts",
        default = "default_properties_max_attempts"
    )]
    pub properties_max_attempts: u32,

    /// Delay before the first raw properties retry (milliseconds)
    #[serde(
        rename = "properties-backoff-ms",
        default = "default_properties_backoff_ms"
    )]
    pub properties_backoff_ms: u64,

    /// Upper bound for the raw properties retry delay (milliseconds)
    #[serde(
        rename = "properties-backoff-max-ms",
        default = "default_properties_backoff_max_ms"
    )]
    pub properties_backoff_max_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            skip_names: default_skip_names(),
            properties_max_attempts: default_properties_max_attempts(),
            properties_backoff_ms: default_properties_backoff_ms(),
            properties_backoff_max_ms: default_properties_backoff_max_ms(),
        }
    }
}

/// Checkpoint file configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    /// Path to the JSON checkpoint file
    pub path: String,
}

/// Relational store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Create missing tables on startup; when false the schema is only verified
    #[serde(rename = "create-schema", default = "default_create_schema")]
    pub create_schema: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_skip_names() -> Vec<String> {
    vec![
        "Page Content".to_string(),
        "Rating Repository".to_string(),
        "Metadata Definition Repository".to_string(),
    ]
}

fn default_properties_max_attempts() -> u32 {
    5
}

fn default_properties_backoff_ms() -> u64 {
    500
}

fn default_properties_backoff_max_ms() -> u64 {
    8_000
}

fn default_create_schema() -> bool {
    true
}

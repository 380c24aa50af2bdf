//! Configuration module for the mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitevision_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring tree below: {}", config.api.root_uri);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, CheckpointConfig, Config, CrawlerConfig, DatabaseConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

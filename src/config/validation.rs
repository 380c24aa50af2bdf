use crate::config::types::{ApiConfig, CheckpointConfig, Config, CrawlerConfig, DatabaseConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_database_config(&config.database)?;
    Ok(())
}

/// Validates the remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    // Node ids are appended verbatim
    if !config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base-url must end with '/', got '{}'",
            config.base_url
        )));
    }

    if config.root_uri.trim().is_empty() {
        return Err(ConfigError::Validation(
            "root-uri cannot be empty".to_string(),
        ));
    }

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "password is set but username is missing".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.properties_max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "properties-max-attempts must be >= 1, got {}",
            config.properties_max_attempts
        )));
    }

    if config.properties_backoff_max_ms < config.properties_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "properties-backoff-max-ms ({}) must be >= properties-backoff-ms ({})",
            config.properties_backoff_max_ms, config.properties_backoff_ms
        )));
    }

    Ok(())
}

fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_database_config(config: &DatabaseConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "database path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

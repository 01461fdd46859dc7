use crate::config::types::{CheckpointConfig, Config, CrawlConfig, HttpConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on dispatch operations per round
pub const MAX_CONCURRENCY: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let root = Url::parse(&config.root_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", config.root_url, e))
    })?;

    if root.scheme() != "http" && root.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Root URL '{}' must use the http or https scheme",
            config.root_url
        )));
    }

    if root.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL '{}' has no host",
            config.root_url
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if let Some(id) = &config.container_id {
        if id.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "container-id '{}' cannot contain whitespace",
                id
            )));
        }
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in &config.cookies {
        validate_cookie(name, value)?;
    }

    Ok(())
}

/// Cookie names and values end up in a single `Cookie` header
fn validate_cookie(name: &str, value: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "cookie name cannot be empty".to_string(),
        ));
    }

    if name
        .chars()
        .any(|c| c == '=' || c == ';' || c.is_whitespace() || c.is_control())
    {
        return Err(ConfigError::Validation(format!(
            "cookie name '{}' contains invalid characters",
            name
        )));
    }

    if value.chars().any(|c| c == ';' || c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "cookie '{}' has a value with invalid characters",
            name
        )));
    }

    Ok(())
}

use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks that the source URLs are well-formed, the extension allow-list is
/// usable, and the retry/timeout knobs are sane. Called by `load_config`
/// after TOML deserialization.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source(config)?;
    validate_harvest(config)?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<(), ConfigError> {
    let base = Url::parse(&config.source.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.source.base_url, e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got {}",
            base.scheme()
        )));
    }

    // Url::join drops the last path segment otherwise
    if !config.source.base_url.ends_with('/') {
        return Err(ConfigError::Validation(
            "base-url must end with '/'".to_string(),
        ));
    }

    if config.source.index_page.trim().is_empty() {
        return Err(ConfigError::Validation(
            "index-page must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_harvest(config: &Config) -> Result<(), ConfigError> {
    let harvest = &config.harvest;

    if harvest.image_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "image-extensions must not be empty".to_string(),
        ));
    }

    for ext in &harvest.image_extensions {
        if ext.is_empty() || ext.contains('.') {
            return Err(ConfigError::Validation(format!(
                "image-extensions entries must be bare extensions, got {:?}",
                ext
            )));
        }
    }

    if harvest.retry_count == 0 {
        return Err(ConfigError::Validation(
            "retry-count must be at least 1".to_string(),
        ));
    }

    if harvest.retry_initial_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "retry-initial-delay-ms must be at least 1".to_string(),
        ));
    }

    if harvest.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

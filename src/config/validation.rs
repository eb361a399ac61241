use crate::config::types::{
    BrowserConfig, Config, HarvestConfig, OutputConfig, ProxyConfig, SummaryConfig,
};
use crate::identity::ProxyEndpoint;
use crate::{ConfigError, HarvestError};
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_browser_config(&config.browser)?;
    validate_harvest_config(&config.harvest)?;
    validate_proxy_config(&config.proxy)?;
    validate_summary_config(&config.summary)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.settle_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "settle_delay_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if !config.target_template.contains("{source}") {
        return Err(ConfigError::Validation(format!(
            "target_template must contain a {{source}} placeholder, got '{}'",
            config.target_template
        )));
    }

    let sample = config.target_template.replace("{source}", "sample");
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target_template: {}", e)))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "target_template must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if Selector::parse(&config.title_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "title_selector is not a valid CSS selector: '{}'",
            config.title_selector
        )));
    }

    if config.max_items < 1 {
        return Err(ConfigError::Validation(
            "max_items must be >= 1".to_string(),
        ));
    }

    if config.scroll_budget < 1 {
        return Err(ConfigError::Validation(
            "scroll_budget must be >= 1".to_string(),
        ));
    }

    if config.max_session_attempts < 1 || config.max_session_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_session_attempts must be between 1 and 10, got {}",
            config.max_session_attempts
        )));
    }

    if config.min_title_chars < 1 || config.min_title_words < 1 {
        return Err(ConfigError::Validation(
            "min_title_chars and min_title_words must be >= 1".to_string(),
        ));
    }

    if config.block_signatures.is_empty() {
        return Err(ConfigError::Validation(
            "block_signatures cannot be empty".to_string(),
        ));
    }

    if config.block_signatures.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "block_signatures cannot contain blank entries".to_string(),
        ));
    }

    if config.boilerplate.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "boilerplate cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.endpoints.is_empty() {
        return Err(ConfigError::EmptyProxyPool);
    }

    for endpoint in &config.endpoints {
        validate_proxy_endpoint(endpoint)?;
    }

    Ok(())
}

/// Validates a proxy URI the same way the pool parses it
fn validate_proxy_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    match ProxyEndpoint::parse(endpoint) {
        Ok(_) => Ok(()),
        Err(HarvestError::UrlParse(e)) => Err(ConfigError::InvalidUrl(format!(
            "Invalid proxy endpoint: {}",
            e
        ))),
        Err(e) => Err(ConfigError::Validation(format!(
            "Invalid proxy endpoint: {}",
            e
        ))),
    }
}

fn validate_summary_config(config: &SummaryConfig) -> Result<(), ConfigError> {
    Url::parse(&config.api_base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base_url: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.batch_limit < 1 || config.batch_limit > 500 {
        return Err(ConfigError::Validation(format!(
            "batch_limit must be between 1 and 500, got {}",
            config.batch_limit
        )));
    }

    if config.target_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target_language cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.titles_path.is_empty() {
        return Err(ConfigError::Validation(
            "titles_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.digest_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "digest_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

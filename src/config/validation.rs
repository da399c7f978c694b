use crate::config::types::{
    CategoryEntry, Config, CrawlerConfig, OutputConfig, SelectorConfig, UserAgentConfig,
};
use crate::{ConfigError, ConfigResult};
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_selectors(&config.selectors)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    // scroll_cap and max_count of 0 are meaningful: a single measurement, no documents

    if config.settle_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "settle_ms must be >= 10ms, got {}ms",
            config.settle_ms
        )));
    }

    if config.element_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "element_timeout_ms must be >= 100ms, got {}ms",
            config.element_timeout_ms
        )));
    }

    if config.poll_interval_ms == 0 || config.poll_interval_ms > config.element_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be between 1 and element_timeout_ms ({}), got {}",
            config.element_timeout_ms, config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates that every landmark selector is a parseable CSS selector
fn validate_selectors(config: &SelectorConfig) -> ConfigResult<()> {
    for (key, selector) in config.entries() {
        if selector.trim().is_empty() {
            return Err(ConfigError::InvalidSelector(format!(
                "selector '{}' cannot be empty",
                key
            )));
        }

        Selector::parse(selector).map_err(|_| {
            ConfigError::InvalidSelector(format!("selector '{}' is not valid CSS: '{}'", key, selector))
        })?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates category entries
fn validate_categories(categories: &[CategoryEntry]) -> ConfigResult<()> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[category]] must be configured".to_string(),
        ));
    }

    let mut labels = HashSet::new();
    for entry in categories {
        if entry.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category for '{}' must have a label",
                entry.url
            )));
        }

        if !labels.insert(entry.label.as_str()) {
            return Err(ConfigError::Validation(format!(
                "category label '{}' is used more than once",
                entry.label
            )));
        }

        let url = Url::parse(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid category URL '{}': {}", entry.url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Category URL '{}' must use HTTP or HTTPS",
                entry.url
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> ConfigResult<()> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

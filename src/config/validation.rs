use crate::config::types::{
    Config, CrawlConfig, LedgerConfig, ProfileEntry, SessionConfig, UserAgentConfig,
};
use crate::url::{parse_base_url, Profile};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_session_config(&config.session)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_ledger_config(&config.ledger)?;
    validate_profiles(&config.profiles)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.target_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "target_directory cannot be empty".to_string(),
        ));
    }

    if !config.settle_interval_seconds.is_finite()
        || config.settle_interval_seconds < 0.0
        || config.settle_interval_seconds > 600.0
    {
        return Err(ConfigError::Validation(format!(
            "settle_interval_seconds must be between 0 and 600, got {}",
            config.settle_interval_seconds
        )));
    }

    if config.max_posts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_posts must be >= 1, got {}",
            config.max_posts
        )));
    }

    if config.stall_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "stall_threshold must be >= 1, got {}",
            config.stall_threshold
        )));
    }

    if config.concurrent_fetches < 1 || config.concurrent_fetches > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrent_fetches must be between 1 and 32, got {}",
            config.concurrent_fetches
        )));
    }

    Ok(())
}

/// Validates browser session configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    parse_base_url(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    let prefix = &config.post_path_prefix;
    if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "post_path_prefix must look like '/p/', got '{}'",
            prefix
        )));
    }

    for (name, value) in [
        ("viewport_width", config.viewport_width),
        ("viewport_height", config.viewport_height),
    ] {
        if !(100..=10_000).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 100 and 10000, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

/// Validates ledger configuration
fn validate_ledger_config(config: &LedgerConfig) -> Result<(), ConfigError> {
    if config.file_name.is_empty() {
        return Err(ConfigError::Validation(
            "ledger file_name cannot be empty".to_string(),
        ));
    }

    if config.file_name.contains('/') || config.file_name.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "ledger file_name must be a bare file name, got '{}'",
            config.file_name
        )));
    }

    Ok(())
}

/// Validates configured profile handles
fn validate_profiles(profiles: &[ProfileEntry]) -> Result<(), ConfigError> {
    for entry in profiles {
        Profile::new(&entry.handle).map_err(|e| ConfigError::Validation(e.to_string()))?;
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
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

use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, GeolocationConfig, OutputConfig, SeedConfig,
    UserAgentConfig,
};
use crate::url::normalize_url;
use crate::ConfigError;
use url::Url;

const MAX_WORKERS_CEILING: usize = 1024;
const MIN_URL_LENGTH: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds, config.crawler.max_url_length)?;
    validate_filters(&config.filters)?;
    validate_geolocation(&config.geolocation)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.limit < 1 {
        return Err(ConfigError::Validation(format!(
            "limit must be >= 1, got {}",
            config.limit
        )));
    }

    if config.max_workers < 1 || config.max_workers > MAX_WORKERS_CEILING {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS_CEILING, config.max_workers
        )));
    }

    if config.max_url_length < MIN_URL_LENGTH {
        return Err(ConfigError::Validation(format!(
            "max_url_length must be >= {}, got {}",
            MIN_URL_LENGTH, config.max_url_length
        )));
    }

    if config.progress_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "progress_interval_ms must be >= 100ms, got {}ms",
            config.progress_interval_ms
        )));
    }

    if config.idle_poll_ms < 1 {
        return Err(ConfigError::Validation(
            "idle_poll_ms must be >= 1ms".to_string(),
        ));
    }

    if config.classifier_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "classifier_workers must be >= 1, got {}",
            config.classifier_workers
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    // The name doubles as the robots.txt product token
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

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed URLs: at least one, each a crawlable http(s) URL
fn validate_seeds(seeds: &SeedConfig, max_url_length: usize) -> Result<(), ConfigError> {
    if seeds.urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &seeds.urls {
        normalize_url(seed, max_url_length).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
        })?;
    }

    Ok(())
}

fn validate_filters(filters: &FilterConfig) -> Result<(), ConfigError> {
    if filters.ignore.iter().any(|entry| entry.trim().is_empty()) {
        // An empty substring would match, and therefore block, every URL
        return Err(ConfigError::Validation(
            "ignore entries cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_geolocation(config: &GeolocationConfig) -> Result<(), ConfigError> {
    if config.cache_size < 1 {
        return Err(ConfigError::Validation(
            "geolocation cache_size must be >= 1".to_string(),
        ));
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid geolocation endpoint: {}", e)))?;

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
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

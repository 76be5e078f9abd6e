use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The keyword file named by `filters.keywords-path` is resolved relative to
/// the configuration file's directory and merged into `filters.keywords`.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    if let Some(keywords_path) = &config.filters.keywords_path {
        let resolved = path
            .parent()
            .map(|dir| dir.join(keywords_path))
            .unwrap_or_else(|| Path::new(keywords_path).to_path_buf());

        let keyword_file =
            std::fs::read_to_string(&resolved).map_err(|source| ConfigError::KeywordFile {
                path: resolved.display().to_string(),
                source,
            })?;

        config
            .filters
            .keywords
            .extend(keyword_file.lines().map(str::to_string));
    }

    config.filters.keywords = normalize_keywords(&config.filters.keywords);

    validate(&config)?;

    Ok(config)
}

/// Trims and lowercases keywords, dropping blanks and duplicates
///
/// Order of first appearance is kept.
pub fn normalize_keywords(raw: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::with_capacity(raw.len());
    for word in raw {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !keywords.contains(&word) {
            keywords.push(word);
        }
    }
    keywords
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Stored with every crawl run so results can be traced back to their settings.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

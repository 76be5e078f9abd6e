//! Configuration module for Trawler
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! including the keyword file referenced from the `[filters]` table.
//!
//! # Example
//!
//! ```no_run
//! use trawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawler.toml")).unwrap();
//! println!("Crawl budget: {}", config.crawler.limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, GeoProvider, GeolocationConfig, OutputConfig,
    SeedConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, normalize_keywords};
pub use validation::validate;

//! URL handling module for Trawler
//!
//! This module provides URL normalization, origin keys for robots.txt caching,
//! and the substring matching used by the keyword filter and the ignore-list.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, origin_key, robots_url};
pub use matcher::{contains_any, first_substring_match};
pub use normalize::{normalize_parsed, normalize_url};

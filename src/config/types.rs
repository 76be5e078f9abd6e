use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Trawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub seeds: SeedConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

/// Crawl budget, pool and timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Visit budget: the crawl drains once visited + blocked reaches this
    pub limit: usize,

    /// Size of the worker pool
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Idle time with an empty frontier before the crawl is declared done (milliseconds)
    #[serde(rename = "stuck-timeout-ms", default = "default_stuck_timeout_ms")]
    pub stuck_timeout_ms: u64,

    /// Grace period for in-flight workers once draining starts (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay before every page fetch (milliseconds)
    #[serde(rename = "pacing-delay-ms", default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    /// Sleep between polls of an empty frontier (milliseconds)
    #[serde(rename = "idle-poll-ms", default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    /// Interval between progress log lines (milliseconds)
    #[serde(rename = "progress-interval-ms", default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// URLs longer than this are never crawled
    #[serde(rename = "max-url-length", default = "default_max_url_length")]
    pub max_url_length: usize,

    /// Whole-request timeout of the HTTP client (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Concurrent article fetches during post-crawl classification
    #[serde(rename = "classifier-workers", default = "default_classifier_workers")]
    pub classifier_workers: usize,
}

impl CrawlerConfig {
    pub fn stuck_timeout(&self) -> Duration {
        Duration::from_millis(self.stuck_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            limit: 4096,
            max_workers: 256,
            stuck_timeout_ms: default_stuck_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            pacing_delay_ms: default_pacing_delay_ms(),
            idle_poll_ms: default_idle_poll_ms(),
            progress_interval_ms: default_progress_interval_ms(),
            max_url_length: default_max_url_length(),
            request_timeout_ms: default_request_timeout_ms(),
            classifier_workers: default_classifier_workers(),
        }
    }
}

fn default_stuck_timeout_ms() -> u64 {
    120_000
}

fn default_settle_delay_ms() -> u64 {
    100_000
}

fn default_pacing_delay_ms() -> u64 {
    100
}

fn default_idle_poll_ms() -> u64 {
    1_000
}

fn default_progress_interval_ms() -> u64 {
    5_000
}

fn default_max_url_length() -> usize {
    120
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_classifier_workers() -> usize {
    4
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt agent token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full `User-Agent` header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving the exported JSON url lists
    #[serde(rename = "export-dir", default = "default_export_dir")]
    pub export_dir: String,
}

fn default_export_dir() -> String {
    ".".to_string()
}

/// Start URLs, crawled in the given order
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub urls: Vec<String>,
}

/// Keyword and ignore-list configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// File with one keyword per line, relative to the config file
    #[serde(rename = "keywords-path", default)]
    pub keywords_path: Option<String>,

    /// Inline keywords; merged with the keyword file on load
    #[serde(default)]
    pub keywords: Vec<String>,

    /// URLs containing any of these substrings are never fetched
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Which geolocation service resolves IPs to regions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeoProvider {
    #[default]
    None,
    IpApi,
}

/// Geolocation collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub provider: GeoProvider,

    /// Base URL; the IP is appended as the last path segment
    #[serde(default = "default_geo_endpoint")]
    pub endpoint: String,

    /// Maximum number of cached IP -> region entries
    #[serde(rename = "cache-size", default = "default_geo_cache_size")]
    pub cache_size: usize,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            provider: GeoProvider::None,
            endpoint: default_geo_endpoint(),
            cache_size: default_geo_cache_size(),
        }
    }
}

fn default_geo_endpoint() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_geo_cache_size() -> usize {
    4096
}

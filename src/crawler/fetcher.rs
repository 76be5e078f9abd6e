//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler:
//! - Building the shared HTTP client with the crawler's identity
//! - Resolving the server IP and its region
//! - Timing and downloading the page body
//!
//! Any HTTP response counts as a fetch, whatever its status. Only failures
//! to get a response at all are errors.
//!
//! Redirects are never followed by the client. A 3xx response is returned as
//! a page carrying its resolved `Location`, and the caller decides whether
//! the target may be crawled.

use crate::config::Config;
use crate::geo::GeoResolver;
use reqwest::header::{HeaderValue, LOCATION};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Connection establishment timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A page that produced an HTTP response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: Url,
    pub status_code: u16,
    /// `Location` of a 3xx response, resolved against `url`
    pub redirect: Option<Url>,
    /// Raw response body
    pub content: Vec<u8>,
    /// Seconds until the response headers arrived
    pub elapsed_secs: f64,
    /// Resolved server address
    pub ip: Option<IpAddr>,
    /// Region of `ip`, when the geolocator knows it
    pub region: Option<String>,
}

/// Failures that leave a URL without any response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("DNS lookup for {host} failed: {source}")]
    Dns {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("DNS lookup for {0} returned no addresses")]
    NoAddress(String),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    fn from_reqwest(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout(url.to_string())
        } else {
            FetchError::Request {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The `User-Agent` header has the form
/// `CrawlerName/Version (+ContactURL; ContactEmail)`. Redirects are not
/// followed, so every hop passes the politeness checks on its own.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .redirect(Policy::none())
        .build()
}

/// Resolves the host of `url` to its first IP address
///
/// IP literal hosts resolve to themselves without a DNS query.
pub async fn resolve_ip(url: &Url) -> Result<IpAddr, FetchError> {
    let host = url
        .host_str()
        .ok_or_else(|| FetchError::MissingHost(url.to_string()))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let mut addrs = tokio::net::lookup_host((host.trim_matches(|c| c == '[' || c == ']'), port))
        .await
        .map_err(|source| FetchError::Dns {
            host: host.to_string(),
            source,
        })?;

    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| FetchError::NoAddress(host.to_string()))
}

/// Resolves a `Location` header against the URL that was requested
fn redirect_target(base: &Url, location: Option<&HeaderValue>) -> Option<Url> {
    let location = location?.to_str().ok()?;
    match base.join(location.trim()) {
        Ok(target) => Some(target),
        Err(e) => {
            tracing::debug!("Bad redirect from {} to '{}': {}", base, location, e);
            None
        }
    }
}

/// Page fetcher shared by all workers
pub struct Fetcher {
    client: Client,
    geo: Arc<GeoResolver>,
}

impl Fetcher {
    pub fn new(client: Client, geo: Arc<GeoResolver>) -> Self {
        Self { client, geo }
    }

    /// Fetches a page and its network metadata
    ///
    /// # Request Flow
    ///
    /// 1. Resolve the host to an IP; a failed lookup abandons the URL
    /// 2. Look up the IP's region (cached, never fails the fetch)
    /// 3. GET the page, timing the wait for the response headers
    /// 4. Note the redirect target of a 3xx response
    /// 5. Read the whole body
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let ip = resolve_ip(url).await?;
        let region = self.geo.region_for(ip).await;

        let started = Instant::now();
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let elapsed_secs = started.elapsed().as_secs_f64();

        let status = response.status();
        let redirect = if status.is_redirection() {
            redirect_target(url, response.headers().get(LOCATION))
        } else {
            None
        };
        let content = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .to_vec();

        tracing::trace!(
            "Fetched {} ({} bytes, status {}, {:.3}s)",
            url,
            content.len(),
            status.as_u16(),
            elapsed_secs
        );

        Ok(FetchedPage {
            url: url.clone(),
            status_code: status.as_u16(),
            redirect,
            content,
            elapsed_secs,
            ip: Some(ip),
            region,
        })
    }

    /// Best-effort IP and region for a URL that will not be fetched
    pub async fn locate(&self, url: &Url) -> (Option<IpAddr>, Option<String>) {
        match resolve_ip(url).await {
            Ok(ip) => (Some(ip), self.geo.region_for(ip).await),
            Err(e) => {
                tracing::debug!("Cannot locate {}: {}", url, e);
                (None, None)
            }
        }
    }
}

//! Per-origin politeness gate
//!
//! The gate decides whether a URL may be fetched. It owns the robots.txt
//! cache for the whole run: one policy per origin, fetched the first time a
//! URL from that origin is checked and never refreshed afterwards.

use crate::robots::ParsedRobots;
use crate::state::Frontier;
use crate::url::{contains_any, origin_key, robots_url};
use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;
use url::Url;

/// robots.txt could not be retrieved at all
#[derive(Debug, Error)]
pub enum PolicyFetchError {
    #[error("robots.txt request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read robots.txt body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Redirect hops followed for robots.txt before giving up
const MAX_ROBOTS_REDIRECTS: usize = 5;

/// Fetches and interprets the robots.txt at `robots_url`
///
/// # Status Handling
///
/// | Response | Policy |
/// |----------|--------|
/// | 2xx | parse body |
/// | 3xx | follow `Location`, up to five hops |
/// | 401, 403 | disallow all |
/// | anything else | allow all |
///
/// The client must not follow redirects itself; hops are followed here.
/// Transport failures are returned as errors; the caller decides how to degrade.
pub async fn fetch_robots(client: &Client, robots_url: &Url) -> Result<ParsedRobots, PolicyFetchError> {
    let mut current = robots_url.clone();
    let mut hops = 0;

    loop {
        let response = client
            .get(current.as_str())
            .send()
            .await
            .map_err(|source| PolicyFetchError::Request {
                url: current.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_redirection() {
            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|location| location.to_str().ok())
                .and_then(|location| current.join(location.trim()).ok());
            match next {
                Some(next) if hops < MAX_ROBOTS_REDIRECTS => {
                    tracing::trace!("robots.txt at {} redirects to {}", current, next);
                    hops += 1;
                    current = next;
                    continue;
                }
                _ => {
                    tracing::debug!("Giving up on redirected robots.txt at {}", robots_url);
                    return Ok(ParsedRobots::allow_all());
                }
            }
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(ParsedRobots::disallow_all());
        }
        if !status.is_success() {
            return Ok(ParsedRobots::allow_all());
        }

        let body = response
            .text()
            .await
            .map_err(|source| PolicyFetchError::Body {
                url: current.to_string(),
                source,
            })?;
        return Ok(ParsedRobots::from_content(&body));
    }
}

/// Decides whether URLs may be fetched, recording refusals as blocked
pub struct PolitenessGate {
    client: Client,
    agent: String,
    ignore: Vec<String>,
    policies: Mutex<HashMap<String, Arc<OnceCell<ParsedRobots>>>>,
}

impl PolitenessGate {
    /// Creates a gate
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `agent` - Product token matched against `User-agent` lines
    /// * `ignore` - Substrings that exclude a URL outright (case-insensitive)
    pub fn new(client: Client, agent: impl Into<String>, ignore: &[String]) -> Self {
        let ignore = ignore
            .iter()
            .map(|entry| entry.trim().to_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();

        Self {
            client,
            agent: agent.into(),
            ignore,
            policies: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `url` matches the ignore-list
    pub fn is_ignored(&self, url: &Url) -> bool {
        contains_any(url.as_str(), &self.ignore)
    }

    /// Number of origins with a cached (or in-flight) policy
    pub fn cached_policies(&self) -> usize {
        self.policies
            .lock()
            .map(|policies| policies.len())
            .unwrap_or_default()
    }

    /// Checks whether `url` may be fetched
    ///
    /// Fetches the origin's robots.txt first if this is the first URL seen from
    /// it. Concurrent callers for the same origin wait on a single request.
    /// A refused URL is recorded as blocked in `frontier`.
    pub async fn allowed(&self, url: &Url, frontier: &Frontier) -> bool {
        if self.is_ignored(url) {
            tracing::debug!("Ignoring {}: matches ignore-list", url);
            frontier.mark_blocked(url);
            return false;
        }

        let cell = self.policy_cell(url);
        let policy = cell.get_or_init(|| self.load_policy(url)).await;
        let allowed = policy.is_allowed(url.as_str(), &self.agent);
        if !allowed {
            tracing::debug!("URL {} disallowed by robots.txt", url);
            frontier.mark_blocked(url);
        }
        allowed
    }

    /// Shared policy slot for the origin of `url`, created empty on first use
    fn policy_cell(&self, url: &Url) -> Arc<OnceCell<ParsedRobots>> {
        let mut policies = self
            .policies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(policies.entry(origin_key(url)).or_default())
    }

    async fn load_policy(&self, url: &Url) -> ParsedRobots {
        let key = origin_key(url);
        let Some(location) = robots_url(url) else {
            return ParsedRobots::allow_all();
        };

        tracing::debug!("Fetching robots.txt for origin: {}", key);
        match fetch_robots(&self.client, &location).await {
            Ok(robots) => robots,
            Err(e) => {
                tracing::warn!("{}; allowing all URLs for {}", e, key);
                ParsedRobots::allow_all()
            }
        }
    }
}

//! Robots.txt policy wrapper
//!
//! Parsing and matching are delegated to the robotstxt crate; this type only
//! remembers the raw body and the blanket outcomes used when no body is
//! available.

use robotstxt::DefaultMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    AllowAll,
    DisallowAll,
    Rules,
}

/// Parsed robots.txt policy for one origin
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content, only consulted for `Policy::Rules`
    content: String,
    policy: Policy,
}

impl ParsedRobots {
    /// Creates a policy from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            policy: Policy::Rules,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// Used when robots.txt is missing, returns an unexpected status, or
    /// cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            policy: Policy::AllowAll,
        }
    }

    /// Creates a policy that refuses everything
    ///
    /// Used when robots.txt itself is access-restricted (401/403).
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            policy: Policy::DisallowAll,
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.policy == Policy::AllowAll
    }

    pub fn is_disallow_all(&self) -> bool {
        self.policy == Policy::DisallowAll
    }

    /// Checks if a URL is allowed for the given agent token
    ///
    /// # Arguments
    ///
    /// * `url` - The full URL to check
    /// * `agent` - The crawler's product token (e.g. `Trawler`)
    ///
    /// # Returns
    ///
    /// * `true` - If the URL may be fetched
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        match self.policy {
            Policy::AllowAll => true,
            Policy::DisallowAll => false,
            Policy::Rules if self.content.trim().is_empty() => true,
            Policy::Rules => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, agent, url)
            }
        }
    }
}

//! `User-Agent` selection for outbound requests.
//!
//! Upstreams that block non-browser clients see a browser identity
//! instead of the caller's. The choice is behind [`UserAgentStrategy`] so
//! the rotating variant can be swapped for a fixed one in tests.

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

const BROWSER_POOL: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6_1) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:130.0) Gecko/20100101 Firefox/130.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/128.0.0.0 Safari/537.36 Edg/128.0.0.0",
];

pub trait UserAgentStrategy: Send + Sync {
    fn choose(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct FixedUserAgent(String);

impl FixedUserAgent {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Default for FixedUserAgent {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl UserAgentStrategy for FixedUserAgent {
    fn choose(&self) -> &str {
        &self.0
    }
}

/// Picks uniformly from a pool on every request.
#[derive(Debug, Clone)]
pub struct RotatingUserAgent {
    pool: Vec<String>,
}

impl RotatingUserAgent {
    /// Returns `None` for an empty pool.
    #[must_use]
    pub fn new(pool: Vec<String>) -> Option<Self> {
        if pool.is_empty() {
            None
        } else {
            Some(Self { pool })
        }
    }

    #[must_use]
    pub fn browsers() -> Self {
        Self {
            pool: BROWSER_POOL.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl UserAgentStrategy for RotatingUserAgent {
    fn choose(&self) -> &str {
        &self.pool[fastrand::usize(..self.pool.len())]
    }
}

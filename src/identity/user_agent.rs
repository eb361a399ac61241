//! User agent selection

use crate::config::UserAgentConfig;
use rand::seq::SliceRandom;

/// Desktop browser user agents used when the config supplies none
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// Supplies a user agent string for each new session
pub trait UserAgentProvider: Send + Sync {
    fn next(&self) -> String;
}

/// Picks uniformly at random from a fixed pool
#[derive(Debug, Clone)]
pub struct RandomUserAgents {
    pool: Vec<String>,
}

impl RandomUserAgents {
    /// Creates a provider over `pool`, falling back to the built-in pool when empty
    pub fn new(pool: Vec<String>) -> Self {
        let pool = if pool.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            pool
        };
        Self { pool }
    }

    pub fn from_config(config: &UserAgentConfig) -> Self {
        Self::new(config.pool.clone())
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl Default for RandomUserAgents {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl UserAgentProvider for RandomUserAgents {
    fn next(&self) -> String {
        self.pool
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }
}

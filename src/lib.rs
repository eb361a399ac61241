//! Driftnet: a feed harvester and digest generator
//!
//! This crate drives a headless browser through a scroll-loaded feed page,
//! collects post titles, and condenses them into a ranked ten-item digest
//! through a language-model adapter. Block pages are handled by rotating
//! proxies a bounded number of times.

pub mod browser;
pub mod config;
pub mod harvest;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod summary;

use std::fmt;
use thiserror::Error;

/// Main error type for Driftnet operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Navigation to {url} did not settle within {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Blocked by source on session attempt {attempt}")]
    BlockedBySource { attempt: u32 },

    #[error("All {attempts} session attempts were blocked by the source")]
    ProxiesExhausted { attempts: u32 },

    #[error("Proxy pool is empty")]
    EmptyProxyPool,

    #[error("Summarization failed: {0}")]
    Summarization(#[from] summary::AdapterError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Proxy error: {0}")]
    Proxy(String),

    #[error("Invalid scrape request: {0}")]
    InvalidRequest(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: pipeline::RunState,
        to: pipeline::RunState,
    },

    #[error("Run cancelled by termination signal")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Closed set of error kinds, used to discriminate failures without
/// inspecting message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NavigationTimeout,
    BlockedBySource,
    ProxiesExhausted,
    EmptyProxyPool,
    SummarizationFailed,
    Browser,
    Proxy,
    InvalidRequest,
    InvalidTransition,
    Cancelled,
    Config,
    Output,
    Io,
}

impl ErrorKind {
    /// Stable snake_case label for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NavigationTimeout => "navigation_timeout",
            Self::BlockedBySource => "blocked_by_source",
            Self::ProxiesExhausted => "proxies_exhausted",
            Self::EmptyProxyPool => "empty_proxy_pool",
            Self::SummarizationFailed => "summarization_failed",
            Self::Browser => "browser",
            Self::Proxy => "proxy",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidTransition => "invalid_transition",
            Self::Cancelled => "cancelled",
            Self::Config => "config",
            Self::Output => "output",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HarvestError {
    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            Self::BlockedBySource { .. } => ErrorKind::BlockedBySource,
            Self::ProxiesExhausted { .. } => ErrorKind::ProxiesExhausted,
            Self::EmptyProxyPool => ErrorKind::EmptyProxyPool,
            Self::Summarization(_) => ErrorKind::SummarizationFailed,
            Self::Browser(_) => ErrorKind::Browser,
            Self::Proxy(_) => ErrorKind::Proxy,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(ConfigError::EmptyProxyPool) => ErrorKind::EmptyProxyPool,
            Self::Config(_) => ErrorKind::Config,
            Self::Output(_) => ErrorKind::Output,
            Self::UrlParse(_) => ErrorKind::InvalidRequest,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns true if the caller may reasonably retry the whole run.
    ///
    /// The harvester itself never retries these.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NavigationTimeout)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No proxy endpoints configured")]
    EmptyProxyPool,
}

/// Result type alias for Driftnet operations
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{Orchestrator, RunStatus, ScrapeRequest, ScrapeResult};
pub use summary::{Category, SummaryItem};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminates_without_message_text() {
        let err = HarvestError::NavigationTimeout {
            url: "https://example.com/".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(err.kind(), ErrorKind::NavigationTimeout);
        assert!(err.is_retryable());

        let err = HarvestError::ProxiesExhausted { attempts: 3 };
        assert_eq!(err.kind(), ErrorKind::ProxiesExhausted);
        assert!(!err.is_retryable());

        assert_eq!(HarvestError::EmptyProxyPool.kind(), ErrorKind::EmptyProxyPool);
        assert!(!HarvestError::Cancelled.is_retryable());
    }

    #[test]
    fn test_adapter_error_maps_to_summarization_failed() {
        let err: HarvestError = summary::AdapterError::Timeout(60).into();
        assert_eq!(err.kind(), ErrorKind::SummarizationFailed);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ErrorKind::ProxiesExhausted.as_str(), "proxies_exhausted");
        assert_eq!(ErrorKind::EmptyProxyPool.to_string(), "empty_proxy_pool");
        assert_eq!(
            ErrorKind::SummarizationFailed.to_string(),
            "summarization_failed"
        );
    }
}

//! Proxy endpoints, the read-only pool, and random selection

use crate::config::ProxyConfig;
use crate::identity::anonymize::AnonymizedEndpoint;
use crate::{HarvestError, HarvestResult};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// An upstream HTTP proxy, optionally carrying credentials
///
/// `Display` and `Debug` never reveal the credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
}

impl ProxyEndpoint {
    /// Parses an `http://[user[:pass]@]host[:port]` URI
    pub fn parse(uri: &str) -> HarvestResult<Self> {
        let url = Url::parse(uri)?;

        if url.scheme() != "http" {
            return Err(HarvestError::Proxy(format!(
                "unsupported proxy scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HarvestError::Proxy("proxy endpoint has no host".to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HarvestError::Proxy("proxy endpoint has no port".to_string()))?;

        let username = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(decode_userinfo)
            .transpose()?;
        let password = url.password().map(decode_userinfo).transpose()?;

        Ok(Self {
            host,
            port,
            username,
            password,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }

    /// Returns `(username, password)` if the endpoint carries credentials
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref().unwrap_or("")))
    }

    /// The endpoint as a `--proxy-server` value with no credentials
    pub fn server_address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_credentials() {
            write!(f, "http://***@{}:{}", self.host, self.port)
        } else {
            write!(f, "http://{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyEndpoint")
            .field(&self.to_string())
            .finish()
    }
}

/// Decodes `%XX` escapes left in URL userinfo
fn decode_userinfo(raw: &str) -> HarvestResult<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| HarvestError::Proxy(format!("proxy credentials are not valid UTF-8: {}", e)))
}

/// Read-only set of proxy endpoints shared by concurrent runs
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
}

impl ProxyPool {
    pub fn new(endpoints: Vec<ProxyEndpoint>) -> Self {
        Self { endpoints }
    }

    pub fn from_config(config: &ProxyConfig) -> HarvestResult<Self> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|uri| ProxyEndpoint::parse(uri))
            .collect::<HarvestResult<Vec<_>>>()?;
        Ok(Self::new(endpoints))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }
}

/// Egress-path selection for new sessions
///
/// Implementations are stateless selectors; retry policy belongs to the caller.
#[async_trait]
pub trait ProxyRotator: Send + Sync {
    /// Selects an endpoint, failing immediately with `EmptyProxyPool` if none exist
    fn pick(&self) -> HarvestResult<ProxyEndpoint>;

    /// Wraps `endpoint` so the browser process never sees its credentials
    async fn anonymize(&self, endpoint: &ProxyEndpoint) -> HarvestResult<AnonymizedEndpoint>;
}

/// Uniform random selection over a shared pool
#[derive(Debug, Clone)]
pub struct RandomProxyRotator {
    pool: Arc<ProxyPool>,
}

impl RandomProxyRotator {
    pub fn new(pool: Arc<ProxyPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ProxyPool {
        &self.pool
    }
}

#[async_trait]
impl ProxyRotator for RandomProxyRotator {
    fn pick(&self) -> HarvestResult<ProxyEndpoint> {
        self.pool
            .endpoints
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(HarvestError::EmptyProxyPool)
    }

    async fn anonymize(&self, endpoint: &ProxyEndpoint) -> HarvestResult<AnonymizedEndpoint> {
        AnonymizedEndpoint::start(endpoint).await
    }
}

//! Session identity: user agents and proxy egress
//!
//! Both capabilities sit behind narrow traits so tests can substitute
//! deterministic fakes for the random selectors.

mod anonymize;
mod proxy;
mod user_agent;

pub use anonymize::AnonymizedEndpoint;
pub use proxy::{ProxyEndpoint, ProxyPool, ProxyRotator, RandomProxyRotator};
pub use user_agent::{RandomUserAgents, UserAgentProvider};

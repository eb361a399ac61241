//! Browser session module
//!
//! This module owns everything that touches a live page:
//! - Capability traits for launching a browser and driving one page
//! - The `Session` handle binding a page to its proxy and user agent
//! - The `Navigator` applying timeouts to navigation
//! - Block-page detection and HTML text extraction
//! - The Chromium backend

mod block;
mod chromium;
mod html;
mod navigator;

pub use block::BlockDetector;
pub use chromium::ChromiumLauncher;
pub use html::{contains_selector, extract_text, visible_text};
pub use navigator::Navigator;

use crate::identity::AnonymizedEndpoint;
use crate::HarvestResult;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Options for launching one browser context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Value for `--proxy-server`; never carries credentials
    pub proxy_server: String,
    pub user_agent: String,
    pub headless: bool,
    pub disable_sandbox: bool,
}

/// One live page in a launched browser
///
/// Timeouts are applied by the caller.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigates to `url` and waits for the page to load
    async fn goto(&mut self, url: &str) -> HarvestResult<()>;

    /// Waits up to `within` for network activity to go quiet after a load
    ///
    /// Returns `Ok(false)` if the page was still fetching when `within`
    /// elapsed. Backends that cannot observe the network report idle at once.
    async fn wait_for_network_idle(&self, _within: Duration) -> HarvestResult<bool> {
        Ok(true)
    }

    /// Returns the currently rendered document as HTML
    async fn content(&self) -> HarvestResult<String>;

    /// Scrolls the viewport to the current bottom of the document
    async fn scroll_to_bottom(&self) -> HarvestResult<()>;

    /// Closes the page and terminates the browser process
    async fn close(&mut self) -> HarvestResult<()>;
}

/// Starts browser processes
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> HarvestResult<Box<dyn PageSession>>;
}

/// A live browser context bound to one proxy and one user agent
///
/// Owned exclusively by a single run.
pub struct Session {
    proxy: AnonymizedEndpoint,
    user_agent: String,
    page: Box<dyn PageSession>,
    closed: bool,
}

impl Session {
    pub fn new(proxy: AnonymizedEndpoint, user_agent: String, page: Box<dyn PageSession>) -> Self {
        Self {
            proxy,
            user_agent,
            page,
            closed: false,
        }
    }

    pub fn proxy(&self) -> &AnonymizedEndpoint {
        &self.proxy
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn page(&self) -> &dyn PageSession {
        self.page.as_ref()
    }

    pub fn page_mut(&mut self) -> &mut dyn PageSession {
        self.page.as_mut()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the page, the browser process and the proxy forwarder.
    ///
    /// Idempotent and infallible: failures are logged.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.page.close().await {
            warn!("Failed to close browser session via {}: {}", self.proxy.upstream(), e);
        }
        self.proxy.close();
        debug!("Session via {} closed", self.proxy.upstream());
    }
}

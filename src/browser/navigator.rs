//! Session lifecycle: launch, navigate, tear down

use crate::browser::html::contains_selector;
use crate::browser::{BrowserLauncher, LaunchOptions, Session};
use crate::config::BrowserConfig;
use crate::identity::AnonymizedEndpoint;
use crate::{HarvestError, HarvestResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Interval between rendered-HTML polls while waiting for a selector
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens sessions and drives navigation with bounded waits
///
/// Each session spawns a full browser process, so a run opens one at a time.
#[derive(Clone)]
pub struct Navigator {
    launcher: Arc<dyn BrowserLauncher>,
    config: BrowserConfig,
}

impl Navigator {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: BrowserConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Launches a browser context behind `proxy` with `user_agent`
    pub async fn open(&self, proxy: AnonymizedEndpoint, user_agent: String) -> HarvestResult<Session> {
        let options = LaunchOptions {
            proxy_server: proxy.proxy_server().to_string(),
            user_agent: user_agent.clone(),
            headless: self.config.headless,
            disable_sandbox: self.config.disable_sandbox,
        };

        info!("Launching browser via {}", proxy.upstream());
        let page = self.launcher.launch(&options).await?;
        Ok(Session::new(proxy, user_agent, page))
    }

    /// Navigates to `target`, failing with `NavigationTimeout` unless the
    /// page loads and its network goes quiet within the configured timeout
    pub async fn goto(&self, session: &mut Session, target: &str) -> HarvestResult<()> {
        let timeout_ms = self.config.navigation_timeout_ms;
        let budget = Duration::from_millis(timeout_ms);
        let started = Instant::now();
        debug!("Navigating to {}", target);

        let settled = tokio::time::timeout(budget, async {
            session.page_mut().goto(target).await?;
            let remaining = budget.saturating_sub(started.elapsed());
            session.page().wait_for_network_idle(remaining).await
        })
        .await;

        match settled {
            Ok(Ok(true)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Ok(Ok(false)) | Err(_) => Err(HarvestError::NavigationTimeout {
                url: target.to_string(),
                timeout_ms,
            }),
        }
    }

    /// Polls the rendered page until `selector` matches or the selector
    /// timeout elapses
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The selector appeared
    /// * `Ok(false)` - The timeout elapsed first
    pub async fn wait_for_selector(&self, session: &Session, selector: &str) -> HarvestResult<bool> {
        let deadline = Instant::now() + Duration::from_millis(self.config.selector_timeout_ms);

        loop {
            let html = session.page().content().await?;
            if contains_selector(&html, selector)? {
                return Ok(true);
            }
            if Instant::now() + SELECTOR_POLL_INTERVAL > deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Tears the session down. Safe on an already-closed session.
    pub async fn close(&self, session: &mut Session) {
        session.close().await;
    }
}

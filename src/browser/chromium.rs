//! Chromium backend driven over the DevTools protocol

use crate::browser::{BrowserLauncher, LaunchOptions, PageSession};
use crate::{HarvestError, HarvestResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Headroom between the navigation timeout and the per-command timeout
const COMMAND_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Quiet period with no new resource entries before the network counts as idle
const NETWORK_QUIET_MS: u64 = 1_000;

/// Launches one Chromium process per session
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    navigation_timeout: Duration,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    /// DevTools commands get a timeout longer than `navigation_timeout`, so
    /// the navigation bound always fires first
    pub fn new(navigation_timeout: Duration) -> Self {
        Self {
            navigation_timeout,
            request_timeout: navigation_timeout + COMMAND_TIMEOUT_MARGIN,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn chrome_config(&self, options: &LaunchOptions) -> HarvestResult<ChromeConfig> {
        let mut builder = ChromeConfig::builder()
            .request_timeout(self.request_timeout)
            .arg(format!("--proxy-server={}", options.proxy_server))
            .arg(format!("--user-agent={}", options.user_agent))
            .arg("--disable-blink-features=AutomationControlled");

        if !options.headless {
            builder = builder.with_head();
        }
        if options.disable_sandbox {
            builder = builder.no_sandbox();
        }

        builder.build().map_err(HarvestError::Browser)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, options: &LaunchOptions) -> HarvestResult<Box<dyn PageSession>> {
        let config = self.chrome_config(options)?;

        let (mut browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to launch chromium: {}", e)))?;
        let handler_task = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(HarvestError::Browser(format!("failed to open page: {}", e)));
            }
        };

        debug!("Chromium launched behind {}", options.proxy_server);
        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            navigation_timeout_ms: self.navigation_timeout.as_millis() as u64,
        }))
    }
}

/// Resolves once the document is complete and no resource entry has been
/// added for the quiet period, or reports failure after `within`
fn network_idle_script(within: Duration) -> String {
    let timeout_ms = within.as_millis().min(u128::from(u64::MAX)) as u64;
    format!(
        r#"(async () => {{
            const timeoutMs = {timeout_ms};
            const quietMs = {quiet_ms};
            const interval = 250;
            const start = Date.now();
            const count = () => {{
                try {{ return performance.getEntriesByType('resource').length; }} catch (_) {{ return 0; }}
            }};

            let lastCount = count();
            let stableMs = 0;
            while (Date.now() - start < timeoutMs) {{
                await new Promise(r => setTimeout(r, interval));
                const curCount = count();
                if (document.readyState === 'complete' && curCount === lastCount) {{
                    stableMs += interval;
                    if (stableMs >= quietMs) {{
                        return {{ ok: true, readyState: document.readyState, resourceCount: curCount, waitedMs: Date.now() - start }};
                    }}
                }} else {{
                    stableMs = 0;
                }}
                lastCount = curCount;
            }}
            return {{ ok: false, readyState: document.readyState, resourceCount: lastCount, waitedMs: Date.now() - start }};
        }})()"#,
        timeout_ms = timeout_ms,
        quiet_ms = NETWORK_QUIET_MS
    )
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("chromium handler stopped: {}", e);
                break;
            }
        }
    })
}

/// A single page in a dedicated Chromium process
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    navigation_timeout_ms: u64,
}

impl ChromiumSession {
    fn page(&self) -> HarvestResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| HarvestError::Browser("session already closed".to_string()))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> HarvestResult<()> {
        match self.page()?.goto(url).await {
            Ok(_) => Ok(()),
            Err(CdpError::Timeout) => Err(HarvestError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: self.navigation_timeout_ms,
            }),
            Err(e) => Err(HarvestError::Browser(format!(
                "navigation to {} failed: {}",
                url, e
            ))),
        }
    }

    async fn wait_for_network_idle(&self, within: Duration) -> HarvestResult<bool> {
        let script = network_idle_script(within);
        let evaluated = match self.page()?.evaluate(script).await {
            Ok(evaluated) => evaluated,
            Err(CdpError::Timeout) => return Ok(false),
            Err(e) => {
                return Err(HarvestError::Browser(format!(
                    "network idle check failed: {}",
                    e
                )))
            }
        };

        let report: Value = evaluated
            .into_value()
            .map_err(|e| HarvestError::Browser(format!("unreadable idle report: {}", e)))?;
        let idle = report.get("ok").and_then(Value::as_bool).unwrap_or(false);
        debug!(
            "Network idle: {} (readyState={}, resources={}, waited={}ms)",
            idle,
            report.get("readyState").and_then(serde_json::Value::as_str).unwrap_or("?"),
            report.get("resourceCount").and_then(serde_json::Value::as_u64).unwrap_or(0),
            report.get("waitedMs").and_then(serde_json::Value::as_u64).unwrap_or(0)
        );
        Ok(idle)
    }

    async fn content(&self) -> HarvestResult<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to read page content: {}", e)))
    }

    async fn scroll_to_bottom(&self) -> HarvestResult<()> {
        self.page()?
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .map_err(|e| HarvestError::Browser(format!("scroll failed: {}", e)))?;
        Ok(())
    }

    async fn close(&mut self) -> HarvestResult<()> {
        let mut first_error = None;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                first_error = Some(format!("failed to close page: {}", e));
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                first_error.get_or_insert(format!("failed to close browser: {}", e));
            }
            if let Err(e) = browser.wait().await {
                first_error.get_or_insert(format!("failed to reap browser process: {}", e));
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        match first_error {
            Some(message) => Err(HarvestError::Browser(message)),
            None => Ok(()),
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        let page = self.page.take();
        let handler_task = self.handler_task.take();

        // Dropping without close() leaves a browser process behind unless a
        // runtime is still around to reap it.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(page) = page {
                        let _ = page.close().await;
                    }
                    let _ = browser.close().await;
                    let _ = browser.wait().await;
                    if let Some(task) = handler_task {
                        task.abort();
                    }
                });
            }
            Err(_) => {
                warn!("Chromium session dropped outside a runtime; process may linger");
                if let Some(task) = handler_task {
                    task.abort();
                }
            }
        }
    }
}

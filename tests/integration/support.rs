//! Scripted fakes for driving the orchestrator without a browser or network

use async_trait::async_trait;
use driftnet::browser::{BrowserLauncher, LaunchOptions, Navigator, PageSession};
use driftnet::config::{BrowserConfig, HarvestConfig};
use driftnet::identity::{AnonymizedEndpoint, ProxyEndpoint, ProxyRotator, UserAgentProvider};
use driftnet::output::{OutputError, OutputResult, TitleSink};
use driftnet::summary::{AdapterError, LlmAdapter, SummaryGenerator};
use driftnet::{HarvestResult, Orchestrator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BLOCK_PAGE: &str =
    "<html><body><h1>Access Denied</h1><p>Reference #18.2f</p></body></html>";

/// What one launched browser shows
#[derive(Debug, Clone)]
pub struct PageScript {
    /// Every read returns the block page
    pub blocked: bool,
    /// DOM after `k` scrolls is `pages[min(k, len - 1)]`
    pub pages: Vec<String>,
    pub goto_delay: Duration,
}

impl PageScript {
    pub fn feed(pages: Vec<String>) -> Self {
        Self {
            blocked: false,
            pages,
            goto_delay: Duration::ZERO,
        }
    }

    pub fn blocked() -> Self {
        Self {
            blocked: true,
            pages: vec![BLOCK_PAGE.to_string()],
            goto_delay: Duration::ZERO,
        }
    }
}

/// Renders titles as feed markup matching the default title selector
pub fn feed_page(titles: &[String]) -> String {
    let posts: String = titles
        .iter()
        .map(|title| {
            format!(
                r#"<shreddit-post><a slot="title" href="/comments/x">{}</a></shreddit-post>"#,
                title
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", posts)
}

/// Distinct valid titles numbered from `range`
pub fn titles(range: std::ops::Range<usize>) -> Vec<String> {
    range
        .map(|i| format!("Community post number {} about systems programming", i))
        .collect()
}

/// A feed that reveals `per_scroll` more titles on each scroll
///
/// The initial DOM already shows the first batch, as a real feed does.
pub fn growing_feed(per_scroll: usize, scrolls: usize) -> Vec<String> {
    let mut pages = vec![feed_page(&titles(0..per_scroll))];
    for k in 1..=scrolls {
        pages.push(feed_page(&titles(0..per_scroll * k)));
    }
    pages
}

#[derive(Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub gotos: AtomicUsize,
    pub scrolls: AtomicUsize,
    /// Session ids in close order
    pub closes: Mutex<Vec<usize>>,
    pub launch_options: Mutex<Vec<LaunchOptions>>,
}

impl Counters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    /// Asserts every launched session was closed exactly once
    pub fn assert_each_closed_once(&self) {
        let mut closes = self.closes.lock().unwrap().clone();
        closes.sort_unstable();
        let expected: Vec<usize> = (0..self.launches()).collect();
        assert_eq!(closes, expected, "every session must be closed exactly once");
    }
}

struct ScriptedPage {
    id: usize,
    script: PageScript,
    scrolls: AtomicUsize,
    counters: Arc<Counters>,
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn goto(&mut self, _url: &str) -> HarvestResult<()> {
        self.counters.gotos.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.script.goto_delay).await;
        Ok(())
    }

    async fn content(&self) -> HarvestResult<String> {
        let scrolls = self.scrolls.load(Ordering::SeqCst);
        let index = scrolls.min(self.script.pages.len() - 1);
        Ok(self.script.pages[index].clone())
    }

    async fn scroll_to_bottom(&self) -> HarvestResult<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        self.counters.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> HarvestResult<()> {
        self.counters.closes.lock().unwrap().push(self.id);
        Ok(())
    }
}

/// Hands out one script per launch; the last one repeats
pub struct ScriptedLauncher {
    scripts: Vec<PageScript>,
    pub counters: Arc<Counters>,
}

impl ScriptedLauncher {
    pub fn new(scripts: Vec<PageScript>) -> Self {
        Self {
            scripts,
            counters: Arc::new(Counters::default()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self, options: &LaunchOptions) -> HarvestResult<Box<dyn PageSession>> {
        let id = self.counters.launches.fetch_add(1, Ordering::SeqCst);
        self.counters
            .launch_options
            .lock()
            .unwrap()
            .push(options.clone());

        let script = self.scripts[id.min(self.scripts.len() - 1)].clone();
        Ok(Box::new(ScriptedPage {
            id,
            script,
            scrolls: AtomicUsize::new(0),
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Cycles through a fixed endpoint list
pub struct SequentialRotator {
    endpoints: Vec<ProxyEndpoint>,
    next: AtomicUsize,
}

impl SequentialRotator {
    pub fn new(uris: &[&str]) -> Self {
        Self {
            endpoints: uris
                .iter()
                .map(|uri| ProxyEndpoint::parse(uri).unwrap())
                .collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn picks(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyRotator for SequentialRotator {
    fn pick(&self) -> HarvestResult<ProxyEndpoint> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(self.endpoints[index % self.endpoints.len()].clone())
    }

    async fn anonymize(&self, endpoint: &ProxyEndpoint) -> HarvestResult<AnonymizedEndpoint> {
        Ok(AnonymizedEndpoint::passthrough(endpoint))
    }
}

pub struct FixedUserAgent;

impl UserAgentProvider for FixedUserAgent {
    fn next(&self) -> String {
        "TestAgent/1.0".to_string()
    }
}

/// Replies with canned text, or fails
pub struct ScriptedAdapter {
    reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmAdapter for ScriptedAdapter {
    async fn summarize_batch(&self, _system: &str, _user: &str) -> Result<String, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(AdapterError::Network)
    }
}

/// Ten well-formed digest lines
pub fn full_reply() -> String {
    (1..=10)
        .map(|i| format!("{}. Publicación número {} (Discussion) - tema popular\n", i, i))
        .collect()
}

#[derive(Default)]
pub struct RecordingSink {
    pub persisted: Mutex<Vec<Vec<String>>>,
    pub fail: bool,
}

impl TitleSink for RecordingSink {
    fn persist(&self, _source: &str, titles: &[String]) -> OutputResult<()> {
        self.persisted.lock().unwrap().push(titles.to_vec());
        if self.fail {
            return Err(OutputError::Write("disk full".to_string()));
        }
        Ok(())
    }
}

/// Everything a scenario needs to inspect after a run
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub counters: Arc<Counters>,
    pub rotator: Arc<SequentialRotator>,
    pub adapter: Arc<ScriptedAdapter>,
    pub sink: Arc<RecordingSink>,
}

pub struct HarnessBuilder {
    scripts: Vec<PageScript>,
    adapter: ScriptedAdapter,
    sink: RecordingSink,
    harvest: HarvestConfig,
    browser: BrowserConfig,
}

impl HarnessBuilder {
    pub fn new(scripts: Vec<PageScript>) -> Self {
        Self {
            scripts,
            adapter: ScriptedAdapter::replying(&full_reply()),
            sink: RecordingSink::default(),
            harvest: HarvestConfig::default(),
            browser: BrowserConfig::default(),
        }
    }

    pub fn adapter(mut self, adapter: ScriptedAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn failing_sink(mut self) -> Self {
        self.sink.fail = true;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.harvest.max_session_attempts = attempts;
        self
    }

    pub fn navigation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.browser.navigation_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> Harness {
        let launcher = ScriptedLauncher::new(self.scripts);
        let counters = Arc::clone(&launcher.counters);
        let rotator = Arc::new(SequentialRotator::new(&[
            "http://proxy-a.example.com:8080",
            "http://proxy-b.example.com:8080",
            "http://proxy-c.example.com:8080",
        ]));
        let adapter = Arc::new(self.adapter);
        let sink = Arc::new(self.sink);

        let generator = SummaryGenerator::new(
            adapter.clone(),
            100,
            "Spanish",
            Duration::from_secs(60),
        );
        let orchestrator = Orchestrator::new(
            &self.harvest,
            Navigator::new(Arc::new(launcher), self.browser),
            rotator.clone(),
            Arc::new(FixedUserAgent),
            generator,
            sink.clone(),
        );

        Harness {
            orchestrator,
            counters,
            rotator,
            adapter,
            sink,
        }
    }
}

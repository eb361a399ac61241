//! Run sequencing: session, block check, rotation, collection, digest

use crate::browser::{BlockDetector, BrowserLauncher, Navigator, Session};
use crate::config::{Config, HarvestConfig};
use crate::harvest::{ScrollCollector, TitleFilter};
use crate::identity::{ProxyPool, ProxyRotator, RandomProxyRotator, RandomUserAgents, UserAgentProvider};
use crate::output::TitleSink;
use crate::pipeline::{RunState, RunStats, RunStatus, ScrapeRequest, ScrapeResult};
use crate::summary::{LlmAdapter, SummaryGenerator};
use crate::{HarvestError, HarvestResult};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Drives one run at a time per call to `run`
///
/// The orchestrator holds no per-run state, so one instance can serve
/// concurrent runs; each run owns its own session.
pub struct Orchestrator {
    navigator: Navigator,
    rotator: Arc<dyn ProxyRotator>,
    user_agents: Arc<dyn UserAgentProvider>,
    detector: BlockDetector,
    collector: ScrollCollector,
    filter: TitleFilter,
    generator: SummaryGenerator,
    sink: Arc<dyn TitleSink>,
    target_template: String,
    max_attempts: u32,
}

impl Orchestrator {
    pub fn new(
        harvest: &HarvestConfig,
        navigator: Navigator,
        rotator: Arc<dyn ProxyRotator>,
        user_agents: Arc<dyn UserAgentProvider>,
        generator: SummaryGenerator,
        sink: Arc<dyn TitleSink>,
    ) -> Self {
        let settle_delay = Duration::from_millis(navigator.config().settle_delay_ms);

        Self {
            navigator,
            rotator,
            user_agents,
            detector: BlockDetector::from_config(harvest),
            collector: ScrollCollector::new(harvest.title_selector.clone(), settle_delay),
            filter: TitleFilter::from_config(harvest),
            generator,
            sink,
            target_template: harvest.target_template.clone(),
            max_attempts: harvest.max_session_attempts,
        }
    }

    /// Wires the production components from a loaded config
    ///
    /// # Errors
    ///
    /// `EmptyProxyPool` if the config lists no proxies, before any session
    /// is opened.
    pub fn from_config(
        config: &Config,
        launcher: Arc<dyn BrowserLauncher>,
        adapter: Arc<dyn LlmAdapter>,
        sink: Arc<dyn TitleSink>,
    ) -> HarvestResult<Self> {
        let pool = ProxyPool::from_config(&config.proxy)?;
        if pool.is_empty() {
            return Err(HarvestError::EmptyProxyPool);
        }
        info!("Loaded {} proxy endpoints", pool.len());

        Ok(Self::new(
            &config.harvest,
            Navigator::new(launcher, config.browser.clone()),
            Arc::new(RandomProxyRotator::new(Arc::new(pool))),
            Arc::new(RandomUserAgents::from_config(&config.user_agent)),
            SummaryGenerator::from_config(adapter, &config.summary),
            sink,
        ))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fills the source id into the target template
    pub fn target_url(&self, source_id: &str) -> HarvestResult<Url> {
        Ok(Url::parse(&self.target_template.replace("{source}", source_id))?)
    }

    /// Executes one run
    ///
    /// Block pages are retried on a fresh session up to the attempt limit.
    /// An empty collection and an adapter failure are reported through
    /// `RunStatus`; everything else is an error. The session is closed
    /// exactly once before this returns, including on cancellation.
    pub async fn run(
        &self,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
    ) -> HarvestResult<ScrapeResult> {
        let mut state = RunState::Idle;
        let mut session = None;

        info!("Starting run for {}", request.source_id());
        let outcome = self.drive(request, cancel, &mut state, &mut session).await;

        if let Some(mut open) = session.take() {
            self.navigator.close(&mut open).await;
        }

        match outcome {
            Ok(result) => {
                info!(
                    "Run for {} finished: {} ({} titles)",
                    request.source_id(),
                    result.status,
                    result.titles.len()
                );
                Ok(result)
            }
            Err(e) => {
                let failed_in = state;
                if let Err(transition) = state.transition(RunState::Failed) {
                    debug!("{}", transition);
                }
                error!(
                    "Run for {} failed in state {}: {} ({})",
                    request.source_id(),
                    failed_in,
                    e,
                    e.kind()
                );
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
        state: &mut RunState,
        slot: &mut Option<Session>,
    ) -> HarvestResult<ScrapeResult> {
        let target = self.target_url(request.source_id())?;

        let rotations = self.acquire(target.as_str(), cancel, state, slot).await?;
        let session = slot
            .as_mut()
            .ok_or_else(|| HarvestError::Browser("no session after acquisition".to_string()))?;

        let selector = self.collector.selector();
        let appeared = cancellable(cancel, self.navigator.wait_for_selector(session, selector)).await?;
        if !appeared {
            warn!(
                "Selector {} did not appear within {}ms",
                selector,
                self.navigator.config().selector_timeout_ms
            );
        }

        state.transition(RunState::Collecting)?;
        let validate = |title: &str| self.filter.accepts(title);
        let collection = cancellable(
            cancel,
            self.collector.collect(
                session,
                request.max_items(),
                request.scroll_budget(),
                &validate,
            ),
        )
        .await?;

        // The page is no longer needed once titles are in hand
        if let Some(mut done) = slot.take() {
            self.navigator.close(&mut done).await;
        }

        let stats = RunStats {
            rotations,
            scroll_iterations: collection.iterations,
            stop_reason: Some(collection.stop_reason),
        };
        let titles = collection.titles.into_vec();

        if titles.is_empty() {
            state.transition(RunState::Done)?;
            return Ok(ScrapeResult {
                source: request.source_id().to_string(),
                titles,
                summary: None,
                status: RunStatus::EmptyExtraction,
                summary_error: None,
                stats,
                finished_at: Utc::now(),
            });
        }

        state.transition(RunState::Summarizing)?;
        if let Err(e) = self.sink.persist(request.source_id(), &titles) {
            warn!("Failed to persist titles for {}: {}", request.source_id(), e);
        }

        let summarized = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
            summarized = self.generator.summarize(&titles, request.source_id()) => summarized,
        };
        state.transition(RunState::Done)?;

        let (summary, status, summary_error) = match summarized {
            Ok(items) => (Some(items), RunStatus::Ok, None),
            Err(e) => {
                let e = HarvestError::from(e);
                warn!("{} ({}); keeping {} titles", e, e.kind(), titles.len());
                (None, RunStatus::SummarizationFailed, Some(e.to_string()))
            }
        };

        Ok(ScrapeResult {
            source: request.source_id().to_string(),
            titles,
            summary,
            status,
            summary_error,
            stats,
            finished_at: Utc::now(),
        })
    }

    /// Opens sessions until one is not blocked, leaving it in `slot`
    ///
    /// Returns the number of rotations performed.
    async fn acquire(
        &self,
        target: &str,
        cancel: &CancellationToken,
        state: &mut RunState,
        slot: &mut Option<Session>,
    ) -> HarvestResult<u32> {
        let mut rotations = 0;

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(HarvestError::Cancelled);
            }
            if attempt > 1 {
                rotations += 1;
            }

            let endpoint = self.rotator.pick()?;
            let proxy = self.rotator.anonymize(&endpoint).await?;
            let user_agent = self.user_agents.next();

            state.transition(RunState::SessionOpen)?;
            debug!("Session attempt {}/{} via {}", attempt, self.max_attempts, endpoint);
            let session = slot.insert(self.navigator.open(proxy, user_agent).await?);

            cancellable(cancel, self.navigator.goto(session, target)).await?;
            state.transition(RunState::Checking)?;

            if !cancellable(cancel, self.detector.is_blocked(session)).await? {
                return Ok(rotations);
            }

            state.transition(RunState::Blocked)?;
            warn!("{} via {}", HarvestError::BlockedBySource { attempt }, endpoint);
            if let Some(mut blocked) = slot.take() {
                self.navigator.close(&mut blocked).await;
            }
        }

        Err(HarvestError::ProxiesExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Races `work` against cancellation
async fn cancellable<T, F>(cancel: &CancellationToken, work: F) -> HarvestResult<T>
where
    F: Future<Output = HarvestResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HarvestError::Cancelled),
        result = work => result,
    }
}

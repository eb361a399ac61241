use crate::support::*;
use driftnet::harvest::StopReason;
use driftnet::identity::{ProxyPool, RandomProxyRotator};
use driftnet::{ErrorKind, RunStatus, ScrapeRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn request(max_items: usize, scroll_budget: u32) -> ScrapeRequest {
    ScrapeRequest::new("rust", max_items, scroll_budget).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_max_items_reached() {
    let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(2, 5))]).build();

    let result = harness
        .orchestrator
        .run(&request(5, 3), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.titles, titles(0..5));
    assert_eq!(result.stats.scroll_iterations, 3);
    assert_eq!(result.stats.stop_reason, Some(StopReason::MaxItemsReached));
    assert_eq!(harness.counters.scrolls(), 3);
    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_stops_on_stagnation_before_budget() {
    let page = feed_page(&titles(0..4));
    let harness = HarnessBuilder::new(vec![PageScript::feed(vec![page])]).build();

    let result = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.titles.len(), 4);
    assert!(result.summary.is_some());
    assert_eq!(result.stats.scroll_iterations, 2);
    assert_eq!(result.stats.stop_reason, Some(StopReason::Stagnated));
    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_one_rotation_after_block() {
    let harness = HarnessBuilder::new(vec![
        PageScript::blocked(),
        PageScript::feed(growing_feed(3, 3)),
    ])
    .build();

    let result = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.stats.rotations, 1);
    assert_eq!(harness.counters.launches(), 2);
    assert_eq!(harness.rotator.picks(), 2);
    assert!(!result.titles.is_empty());

    // Each session went out through a different proxy
    let options = harness.counters.launch_options.lock().unwrap();
    assert_eq!(options[0].proxy_server, "http://proxy-a.example.com:8080");
    assert_eq!(options[1].proxy_server, "http://proxy-b.example.com:8080");
    assert!(options.iter().all(|o| o.user_agent == "TestAgent/1.0"));
    drop(options);

    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_blocked_on_every_attempt_exhausts_proxies() {
    let harness = HarnessBuilder::new(vec![PageScript::blocked()])
        .max_attempts(3)
        .build();

    let err = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProxiesExhausted);
    assert!(!err.is_retryable());
    assert_eq!(harness.counters.launches(), 3);
    assert_eq!(harness.counters.scrolls(), 0, "must never start collecting");
    assert_eq!(harness.adapter.calls(), 0);
    assert!(harness.sink.persisted.lock().unwrap().is_empty());
    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_nothing_valid_is_empty_extraction() {
    let junk = vec![
        "Short".to_string(),
        "Continue this thread for more replies".to_string(),
        "two words".to_string(),
    ];
    let harness = HarnessBuilder::new(vec![PageScript::feed(vec![feed_page(&junk)])]).build();

    let result = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::EmptyExtraction);
    assert!(result.titles.is_empty());
    assert!(result.summary.is_none());
    assert_eq!(harness.adapter.calls(), 0);
    assert!(harness.sink.persisted.lock().unwrap().is_empty());
    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_partial_adapter_reply_is_padded() {
    let reply: String = (1..=6)
        .map(|i| format!("{}. Título traducido {} (News) - razón {}\n", i, i, i))
        .chain(std::iter::once("Nota final sin formato".to_string()))
        .collect();
    let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(4, 3))])
        .adapter(ScriptedAdapter::replying(&reply))
        .build();

    let result = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    let summary = result.summary.unwrap();
    assert_eq!(summary.len(), 10);
    for (index, item) in summary.iter().enumerate() {
        assert_eq!(item.rank as usize, index + 1);
        assert_eq!(item.is_placeholder(), index >= 6);
    }
    assert_eq!(summary[5].text, "Título traducido 6");
    assert_eq!(
        summary[6].to_line(),
        "7. Analysis unavailable - title did not meet criteria"
    );
}

#[tokio::test(start_paused = true)]
async fn test_adapter_failure_keeps_titles() {
    let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(3, 2))])
        .adapter(ScriptedAdapter::failing("connection reset by peer"))
        .build();

    let result = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::SummarizationFailed);
    assert!(result.summary.is_none());
    assert_eq!(result.titles.len(), 6);
    assert!(result
        .summary_error
        .as_deref()
        .is_some_and(|e| e.contains("connection reset by peer")));

    // Titles reach the sink before the adapter is asked
    let persisted = harness.sink.persisted.lock().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0], result.titles);
    drop(persisted);

    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_sink_failure_does_not_fail_run() {
    let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(2, 2))])
        .failing_sink()
        .build();

    let result = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(harness.adapter.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_timeout_fails_run_and_closes_session() {
    let mut slow = PageScript::feed(growing_feed(2, 2));
    slow.goto_delay = Duration::from_secs(60);
    let harness = HarnessBuilder::new(vec![slow])
        .navigation_timeout_ms(30_000)
        .build();

    let err = harness
        .orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NavigationTimeout);
    assert!(err.is_retryable());
    assert_eq!(harness.counters.launches(), 1);
    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_closes_session() {
    let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(2, 10))]).build();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        // Lands inside the first scroll's settle delay
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let err = harness
        .orchestrator
        .run(&request(50, 10), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(harness.adapter.calls(), 0);
    harness.counters.assert_each_closed_once();
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_start_opens_nothing() {
    let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(2, 2))]).build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .orchestrator
        .run(&request(50, 10), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(harness.counters.launches(), 0);
}

#[tokio::test]
async fn test_empty_pool_fails_before_any_session() {
    use driftnet::browser::Navigator;
    use driftnet::config::{BrowserConfig, HarvestConfig};
    use driftnet::summary::SummaryGenerator;
    use driftnet::Orchestrator;

    let launcher = ScriptedLauncher::new(vec![PageScript::feed(growing_feed(2, 2))]);
    let counters = Arc::clone(&launcher.counters);
    let orchestrator = Orchestrator::new(
        &HarvestConfig::default(),
        Navigator::new(Arc::new(launcher), BrowserConfig::default()),
        Arc::new(RandomProxyRotator::new(Arc::new(ProxyPool::default()))),
        Arc::new(FixedUserAgent),
        SummaryGenerator::new(
            Arc::new(ScriptedAdapter::replying(&full_reply())),
            100,
            "Spanish",
            Duration::from_secs(60),
        ),
        Arc::new(RecordingSink::default()),
    );

    let err = orchestrator
        .run(&request(50, 10), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyProxyPool);
    assert_eq!(counters.launches(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_titles_never_exceed_max_items() {
    for max_items in [1, 3, 7, 12] {
        let harness = HarnessBuilder::new(vec![PageScript::feed(growing_feed(5, 6))]).build();

        let result = harness
            .orchestrator
            .run(&request(max_items, 10), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.titles.len() <= max_items);
        assert_eq!(result.titles.len(), max_items);
        assert_eq!(result.summary.map(|s| s.len()), Some(10));
    }
}

//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet feed harvester.

use anyhow::Context;
use clap::Parser;
use driftnet::browser::ChromiumLauncher;
use driftnet::config::{load_config_with_hash, Config};
use driftnet::output::{write_markdown_digest, FileTitleSink, NullTitleSink, TitleSink};
use driftnet::summary::OpenAiAdapter;
use driftnet::{ErrorKind, HarvestError, Orchestrator, RunStatus, ScrapeRequest, ScrapeResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit code for runs that collected titles but produced no digest
const EXIT_PARTIAL: u8 = 2;

/// Driftnet: a feed harvester and digest generator
///
/// Driftnet scrolls a feed page in a headless browser behind a rotating
/// proxy, collects post titles, and asks a language model for a ranked
/// ten-item digest.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version = "1.0.0")]
#[command(about = "A feed harvester and digest generator", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Source (topic) identifier to harvest, e.g. a subreddit name
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Maximum number of titles to collect (overrides config)
    #[arg(long)]
    max_items: Option<usize>,

    /// Maximum number of scroll iterations (overrides config)
    #[arg(long)]
    scroll_budget: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and request and show what would be run
    #[arg(long)]
    dry_run: bool,

    /// Print the result as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            let message = e
                .downcast_ref::<HarvestError>()
                .map(|harvest| user_message(harvest.kind()))
                .unwrap_or("An unexpected error occurred. Please try again later.");
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config).map_err(HarvestError::from)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let request = ScrapeRequest::new(
        &cli.source,
        cli.max_items.unwrap_or(config.harvest.max_items),
        cli.scroll_budget.unwrap_or(config.harvest.scroll_budget),
    )?;

    if cli.dry_run {
        handle_dry_run(&config, &request)?;
        return Ok(ExitCode::SUCCESS);
    }

    let api_key = std::env::var(&config.summary.api_key_env).with_context(|| {
        format!(
            "environment variable {} must hold the API key",
            config.summary.api_key_env
        )
    })?;
    let adapter = OpenAiAdapter::from_config(&config.summary, &api_key)
        .map_err(HarvestError::from)?;
    let launcher = ChromiumLauncher::new(Duration::from_millis(
        config.browser.navigation_timeout_ms,
    ));
    let sink: Arc<dyn TitleSink> = Arc::new(FileTitleSink::new(&config.output.titles_path));

    let orchestrator =
        Orchestrator::from_config(&config, Arc::new(launcher), Arc::new(adapter), sink)?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let result = orchestrator.run(&request, &cancel).await?;

    if let Some(path) = &config.output.digest_path {
        match write_markdown_digest(&result, Path::new(path)) {
            Ok(()) => tracing::info!("Digest written to {}", path),
            Err(e) => tracing::warn!("Failed to write digest to {}: {}", path, e),
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(match result.status {
        RunStatus::Ok | RunStatus::EmptyExtraction => ExitCode::SUCCESS,
        RunStatus::SummarizationFailed => ExitCode::from(EXIT_PARTIAL),
    })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancels `token` on Ctrl-C or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::warn!("Termination signal received; closing session");
    token.cancel();
}

/// Handles the --dry-run mode: validates config and shows what would be run
fn handle_dry_run(config: &Config, request: &ScrapeRequest) -> anyhow::Result<()> {
    // Wiring the orchestrator checks the proxy list the same way a real run does
    let orchestrator = Orchestrator::from_config(
        config,
        Arc::new(ChromiumLauncher::new(Duration::from_millis(
            config.browser.navigation_timeout_ms,
        ))),
        Arc::new(OpenAiAdapter::new("", &config.summary.model)),
        Arc::new(NullTitleSink),
    )?;
    let target = orchestrator.target_url(request.source_id())?;

    println!("=== Driftnet Dry Run ===\n");

    println!("Request:");
    println!("  Source: {}", request.source_id());
    println!("  Target: {}", target);
    println!("  Max items: {}", request.max_items());
    println!("  Scroll budget: {}", request.scroll_budget());

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!("  Sandbox disabled: {}", config.browser.disable_sandbox);
    println!(
        "  Navigation timeout: {}ms",
        config.browser.navigation_timeout_ms
    );
    println!("  Settle delay: {}ms", config.browser.settle_delay_ms);

    println!("\nHarvest:");
    println!("  Title selector: {}", config.harvest.title_selector);
    println!("  Session attempts: {}", orchestrator.max_attempts());
    println!(
        "  Block signatures: {}",
        config.harvest.block_signatures.join(", ")
    );

    println!("\nProxies ({}):", config.proxy.endpoints.len());
    for endpoint in &config.proxy.endpoints {
        match driftnet::identity::ProxyEndpoint::parse(endpoint) {
            Ok(parsed) => println!("  - {}", parsed),
            Err(e) => println!("  - invalid: {}", e),
        }
    }

    println!("\nSummary:");
    println!("  Model: {}", config.summary.model);
    println!("  Language: {}", config.summary.target_language);
    println!("  Batch limit: {}", config.summary.batch_limit);
    println!("  API key variable: {}", config.summary.api_key_env);

    println!("\nOutput:");
    println!("  Titles: {}", config.output.titles_path);
    if let Some(digest) = &config.output.digest_path {
        println!("  Digest: {}", digest);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

fn print_result(result: &ScrapeResult) {
    println!("{}: {}", result.source, result.status.message());

    match &result.summary {
        Some(items) => {
            println!();
            for item in items {
                println!("{}", item);
            }
        }
        None => {
            if let Some(error) = &result.summary_error {
                println!("  ({})", error);
            }
        }
    }

    println!(
        "\n{} titles collected in {} scrolls",
        result.titles.len(),
        result.stats.scroll_iterations
    );
}

/// Human-readable message for a failed run
fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NavigationTimeout => "Timed out waiting for the page. Try again with fewer posts.",
        ErrorKind::ProxiesExhausted | ErrorKind::BlockedBySource => {
            "The source blocked every proxy we tried. Try again later."
        }
        ErrorKind::EmptyProxyPool => "No proxies are configured.",
        ErrorKind::InvalidRequest => {
            "Invalid source. Use only letters, numbers, underscores and hyphens."
        }
        ErrorKind::Cancelled => "Run cancelled.",
        ErrorKind::Config => "The configuration file is invalid.",
        ErrorKind::SummarizationFailed => "The digest could not be generated.",
        ErrorKind::Browser
        | ErrorKind::Proxy
        | ErrorKind::InvalidTransition
        | ErrorKind::Output
        | ErrorKind::Io => "An unexpected error occurred. Please try again later.",
    }
}

use serde::Deserialize;

/// Main configuration structure for Driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    pub proxy: ProxyConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub summary: SummaryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run the browser without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Pass --no-sandbox to the browser (needed in some containers)
    #[serde(default)]
    pub disable_sandbox: bool,

    /// Maximum time for the target page to settle (milliseconds)
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Maximum time to wait for the title selector to appear (milliseconds)
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Delay after each scroll for lazy-loaded content (milliseconds)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            disable_sandbox: false,
            navigation_timeout_ms: default_navigation_timeout_ms(),
            selector_timeout_ms: default_selector_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Harvesting behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarvestConfig {
    /// Target URL with a `{source}` placeholder
    #[serde(default = "default_target_template")]
    pub target_template: String,

    /// CSS selector matching title nodes
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Default maximum titles per run
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Default maximum scroll iterations per run
    #[serde(default = "default_scroll_budget")]
    pub scroll_budget: u32,

    /// Sessions opened per run before giving up on blocks
    #[serde(default = "default_max_session_attempts")]
    pub max_session_attempts: u32,

    /// Minimum title length in characters
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: usize,

    /// Minimum title length in words
    #[serde(default = "default_min_title_words")]
    pub min_title_words: usize,

    /// Phrases marking non-post boilerplate text
    #[serde(default = "default_boilerplate")]
    pub boilerplate: Vec<String>,

    /// Substrings marking a block page
    #[serde(default = "default_block_signatures")]
    pub block_signatures: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_template: default_target_template(),
            title_selector: default_title_selector(),
            max_items: default_max_items(),
            scroll_budget: default_scroll_budget(),
            max_session_attempts: default_max_session_attempts(),
            min_title_chars: default_min_title_chars(),
            min_title_words: default_min_title_words(),
            boilerplate: default_boilerplate(),
            block_signatures: default_block_signatures(),
        }
    }
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Upstream proxy URIs, optionally carrying credentials
    pub endpoints: Vec<String>,
}

/// User agent pool configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAgentConfig {
    /// User agent strings to choose from; empty selects the built-in pool
    #[serde(default)]
    pub pool: Vec<String>,
}

/// Language-model adapter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SummaryConfig {
    /// Base URL of the chat completions API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Adapter call timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of titles sent in one adapter call
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Language the digest is written in
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            batch_limit: default_batch_limit(),
            target_language: default_target_language(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the newline-delimited title file
    #[serde(default = "default_titles_path")]
    pub titles_path: String,

    /// Path of the markdown digest, if one should be written
    #[serde(default)]
    pub digest_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            titles_path: default_titles_path(),
            digest_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_selector_timeout_ms() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

fn default_target_template() -> String {
    "https://www.reddit.com/r/{source}/".to_string()
}

fn default_title_selector() -> String {
    r#"a[slot="title"]"#.to_string()
}

fn default_max_items() -> usize {
    50
}

fn default_scroll_budget() -> u32 {
    10
}

fn default_max_session_attempts() -> u32 {
    3
}

fn default_min_title_chars() -> usize {
    15
}

fn default_min_title_words() -> usize {
    3
}

fn default_boilerplate() -> Vec<String> {
    [
        "continue this thread",
        "view more comments",
        "log in to reddit",
        "sign up to see more",
        "promoted by",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_block_signatures() -> Vec<String> {
    vec!["access denied".to_string(), "robot check".to_string()]
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_batch_limit() -> usize {
    100
}

fn default_target_language() -> String {
    "Spanish".to_string()
}

fn default_titles_path() -> String {
    "titles.txt".to_string()
}

//! Clean, prompt, call, parse, pad

use crate::config::SummaryConfig;
use crate::summary::clean::prepare_batch;
use crate::summary::parse::{pad_summary, parse_summary, DIGEST_LEN};
use crate::summary::{AdapterError, Category, LlmAdapter, SummaryItem};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Turns a title list into a ten-entry ranked digest
#[derive(Clone)]
pub struct SummaryGenerator {
    adapter: Arc<dyn LlmAdapter>,
    batch_limit: usize,
    target_language: String,
    timeout: Duration,
}

impl SummaryGenerator {
    pub fn new(
        adapter: Arc<dyn LlmAdapter>,
        batch_limit: usize,
        target_language: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            adapter,
            batch_limit,
            target_language: target_language.into(),
            timeout,
        }
    }

    pub fn from_config(adapter: Arc<dyn LlmAdapter>, config: &SummaryConfig) -> Self {
        Self::new(
            adapter,
            config.batch_limit,
            config.target_language.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Role instruction sent as the system prompt
    pub fn system_prompt(&self, topic_label: &str) -> String {
        let categories = Category::all()
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "You condense post titles from the \"{topic}\" community into a ranked digest.\n\
             Pick the {n} most representative titles and rewrite each one in {language}.\n\
             Assign each exactly one category from this list, spelled as given: {categories}.\n\
             Reply with exactly {n} lines and nothing else. Every line must have the form:\n\
             <rank>. <title> (<category>) - <rationale>\n\
             where <rank> runs from 1 to {n} and <rationale> is one short sentence in {language}.",
            topic = topic_label,
            n = DIGEST_LEN,
            language = self.target_language,
            categories = categories,
        )
    }

    /// Produces exactly ten entries for `titles`
    ///
    /// Lines that do not match the digest format are replaced by
    /// placeholders. When no title survives cleaning the adapter is not
    /// called and every entry is a placeholder.
    pub async fn summarize(
        &self,
        titles: &[String],
        topic_label: &str,
    ) -> Result<Vec<SummaryItem>, AdapterError> {
        let batch = prepare_batch(titles, self.batch_limit);
        if batch.is_empty() {
            warn!("No titles survived cleaning; digest is all placeholders");
            return Ok(pad_summary(Vec::new()));
        }

        info!(
            "Summarizing {} of {} titles for {}",
            batch.len(),
            titles.len(),
            topic_label
        );

        let system = self.system_prompt(topic_label);
        let user = batch.join("\n");

        let response = tokio::time::timeout(self.timeout, self.adapter.summarize_batch(&system, &user))
            .await
            .map_err(|_| AdapterError::Timeout(self.timeout.as_secs()))??;

        let items = parse_summary(&response);
        if items.len() < DIGEST_LEN {
            warn!(
                "Adapter returned {} well-formed lines; padding to {}",
                items.len(),
                DIGEST_LEN
            );
        }

        Ok(pad_summary(items))
    }
}

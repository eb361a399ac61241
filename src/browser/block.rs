//! Block-page detection

use crate::browser::html::visible_text;
use crate::browser::Session;
use crate::config::HarvestConfig;
use crate::HarvestResult;

/// Matches rendered page text against known block signatures
///
/// The signature set is kept narrow: a missed new block page is acceptable,
/// a false positive throws away a working session.
#[derive(Debug, Clone)]
pub struct BlockDetector {
    signatures: Vec<String>,
}

impl BlockDetector {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            signatures: signatures
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(&config.block_signatures)
    }

    /// Case-insensitive substring match against every signature
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.signatures.iter().any(|sig| text.contains(sig.as_str()))
    }

    /// Reads the session's rendered page and reports whether it is a block page
    pub async fn is_blocked(&self, session: &Session) -> HarvestResult<bool> {
        let html = session.page().content().await?;
        Ok(self.matches(&visible_text(&html)))
    }
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::from_config(&HarvestConfig::default())
    }
}

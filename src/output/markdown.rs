//! Markdown digest generation
//!
//! This module renders a finished run as a human-readable markdown report:
//! run metadata, the ranked digest and the collected titles.

use crate::output::OutputResult;
use crate::pipeline::ScrapeResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Titles listed in full before the report truncates
const MAX_LISTED_TITLES: usize = 100;

/// Writes the markdown digest for `result` to `output_path`
///
/// # Arguments
///
/// * `result` - The finished run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the digest
/// * `Err(OutputError)` - Failed to write the digest
pub fn write_markdown_digest(result: &ScrapeResult, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_digest(result);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a finished run as markdown
pub fn format_markdown_digest(result: &ScrapeResult) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Digest: {}\n\n", result.source));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Finished**: {}\n",
        result.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **Status**: {}\n", result.status));
    md.push_str(&format!("- **Titles Collected**: {}\n", result.titles.len()));
    md.push_str(&format!(
        "- **Scroll Iterations**: {}\n",
        result.stats.scroll_iterations
    ));
    if let Some(reason) = result.stats.stop_reason {
        md.push_str(&format!("- **Stopped Because**: {}\n", reason.as_str()));
    }
    md.push_str(&format!(
        "- **Proxy Rotations**: {}\n\n",
        result.stats.rotations
    ));

    // Ranked digest
    md.push_str("## Ranked Digest\n\n");
    match &result.summary {
        Some(items) => {
            md.push_str("| Rank | Title | Category | Rationale |\n");
            md.push_str("|------|-------|----------|-----------|\n");
            for item in items {
                if item.is_placeholder() {
                    md.push_str(&format!(
                        "| {} | _{}_ | - | {} |\n",
                        item.rank,
                        escape_cell(&item.text),
                        escape_cell(&item.rationale)
                    ));
                } else {
                    md.push_str(&format!(
                        "| {} | {} | {} | {} |\n",
                        item.rank,
                        escape_cell(&item.text),
                        item.category,
                        escape_cell(&item.rationale)
                    ));
                }
            }
            md.push('\n');
        }
        None => {
            md.push_str(&format!("_{}_\n\n", result.status.message()));
            if let Some(error) = &result.summary_error {
                md.push_str(&format!("Adapter error: `{}`\n\n", error));
            }
        }
    }

    // Collected titles
    if !result.titles.is_empty() {
        md.push_str("## Collected Titles\n\n");
        for title in result.titles.iter().take(MAX_LISTED_TITLES) {
            md.push_str(&format!("- {}\n", title));
        }
        if result.titles.len() > MAX_LISTED_TITLES {
            md.push_str(&format!(
                "\n... and {} more\n",
                result.titles.len() - MAX_LISTED_TITLES
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

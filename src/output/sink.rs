//! Title persistence

use crate::output::{OutputError, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives the final title list of a run
pub trait TitleSink: Send + Sync {
    fn persist(&self, source: &str, titles: &[String]) -> OutputResult<()>;
}

/// Overwrites a UTF-8 file with one title per line
#[derive(Debug, Clone)]
pub struct FileTitleSink {
    path: PathBuf,
}

impl FileTitleSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TitleSink for FileTitleSink {
    fn persist(&self, source: &str, titles: &[String]) -> OutputResult<()> {
        if let Some(title) = titles.iter().find(|t| t.contains('\n') || t.contains('\r')) {
            return Err(OutputError::Format(format!(
                "title spans multiple lines: {:?}",
                title
            )));
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(titles.join("\n").as_bytes())?;
        writer
            .into_inner()
            .map_err(|e| OutputError::Write(e.to_string()))?
            .sync_all()?;

        info!(
            "Saved {} titles for {} to {}",
            titles.len(),
            source,
            self.path.display()
        );
        Ok(())
    }
}

/// Discards titles; used for dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTitleSink;

impl TitleSink for NullTitleSink {
    fn persist(&self, _source: &str, _titles: &[String]) -> OutputResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_one_title_per_line() {
        let dir = TempDir::new().unwrap();
        let sink = FileTitleSink::new(dir.path().join("titles.txt"));

        let titles = vec![
            "First post title here".to_string(),
            "¿Segundo título con acentos?".to_string(),
        ];
        sink.persist("rust", &titles).unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "First post title here\n¿Segundo título con acentos?");
    }

    #[test]
    fn test_overwrites_previous_run() {
        let dir = TempDir::new().unwrap();
        let sink = FileTitleSink::new(dir.path().join("titles.txt"));

        sink.persist("rust", &["old title one".to_string(), "old two".to_string()])
            .unwrap();
        sink.persist("rust", &["new title".to_string()]).unwrap();

        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "new title");
    }

    #[test]
    fn test_rejects_multiline_titles() {
        let dir = TempDir::new().unwrap();
        let sink = FileTitleSink::new(dir.path().join("titles.txt"));

        let err = sink
            .persist("rust", &["broken\ntitle".to_string()])
            .unwrap_err();
        assert!(matches!(err, OutputError::Format(_)));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let sink = FileTitleSink::new(dir.path().join("missing").join("titles.txt"));

        let err = sink.persist("rust", &["a title".to_string()]).unwrap_err();
        assert!(matches!(err, OutputError::Io(_)));
    }
}

//! Reversed, read-only view over the cron log
//!
//! The log is appended to, so the newest attempt sits at the end of the file. The store
//! flips that around once at load time: index 0 is the newest line and indices grow
//! towards the oldest entry.

use crate::error::{ParseError, Result};
use crate::models::LogLine;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LineStore {
    lines: Vec<String>,
}

impl LineStore {
    /// Read the whole log file, newest line first
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file: {}", path.display()))?;
        let store = Self::from_lines(content.lines());
        debug!(path = %path.display(), lines = store.len(), "Loaded log file");
        Ok(store)
    }

    /// Build a store from lines in file order (oldest first)
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect();
        lines.reverse();
        Self { lines }
    }

    /// Fetch line `index`; running past the oldest line means the log is exhausted
    pub fn get(&self, index: usize) -> Result<LogLine> {
        self.lines
            .get(index)
            .map(|text| LogLine::new(text, index))
            .ok_or(ParseError::NoLogs)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = LogLine> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, text)| LogLine::new(text, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_newest_first() {
        let store = LineStore::from_lines(["oldest", "middle", "newest"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(0).unwrap().text, "newest");
        assert_eq!(store.get(2).unwrap().text, "oldest");
    }

    #[test]
    fn test_get_past_end_is_exhaustion() {
        let store = LineStore::from_lines(["only"]);
        assert!(matches!(store.get(1), Err(ParseError::NoLogs)));
        assert!(matches!(LineStore::default().get(0), Err(ParseError::NoLogs)));
    }

    #[test]
    fn test_trailing_whitespace_stripped_on_get() {
        let store = LineStore::from_lines(["---   "]);
        assert_eq!(store.get(0).unwrap().text, "---");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file, "second").unwrap();
        file.flush().unwrap();

        let store = LineStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        let texts: Vec<String> = store.iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LineStore::load(Path::new("/definitely/not/here.log")).unwrap_err();
        assert!(err.to_string().contains("Failed to read log file"));
    }
}

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Every failure the scraper distinguishes. Callers match on the variant to
/// pick a fallback: config errors degrade to interactive entry or constants,
/// fetch and sink errors abort the current page only.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("malformed config {}: {reason}", .path.display())]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("invalid date {input:?}: {reason}")]
    DateParse { input: String, reason: String },

    #[error("fetch failed for page '{page}': {message}")]
    Fetch { page: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScrapeError {
    pub fn fetch(page: impl Into<String>, message: impl ToString) -> Self {
        ScrapeError::Fetch { page: page.into(), message: message.to_string() }
    }

    pub fn date(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ScrapeError::DateParse { input: input.into(), reason: reason.into() }
    }

    /// True for the two errors that send batch mode back to interactive entry.
    pub fn is_config_fallback(&self) -> bool {
        matches!(self, ScrapeError::ConfigNotFound(_) | ScrapeError::ConfigMalformed { .. })
    }
}

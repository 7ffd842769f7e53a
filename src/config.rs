use crate::date::DateInput;
use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use time::macros::date;
use time::Date;

/// CSV header, in the order every row is written.
pub const CSV_HEADER: [&str; 6] = ["comment", "comment_id", "comment_time", "post", "post_id", "post_time"];

/// Run-wide knobs with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    pub out_dir: PathBuf,
    pub page_budget: u32,              // listing pages requested from the source per page
    pub posts_per_page: u32,           // page-size hint passed to the source
    pub fallback_start: Date,          // used when no start date resolves
    pub fallback_max_comments: usize,  // used when no comment cap resolves
    pub progress: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            page_budget: 100,
            posts_per_page: 200,
            fallback_start: date!(2022 - 01 - 01),
            fallback_max_comments: 1000,
            progress: true,
        }
    }
}

impl ScrapeOptions {
    pub fn with_out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_page_budget(mut self, pages: u32) -> Self {
        self.page_budget = pages.max(1);
        self
    }
    pub fn with_posts_per_page(mut self, n: u32) -> Self {
        self.posts_per_page = n.max(1);
        self
    }
    pub fn with_fallback_start(mut self, start: Date) -> Self {
        self.fallback_start = start;
        self
    }
    pub fn with_fallback_max_comments(mut self, n: usize) -> Self {
        self.fallback_max_comments = n;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}

/// Login handed to the post source. Some pages are readable without one.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    #[serde(rename = "pass")]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("email", &self.email).field("password", &"<redacted>").finish()
    }
}

/// Optional per-page settings; also the shape of the `defaults` object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RawOverrides {
    pub start_date: Option<DateInput>,
    pub end_date: Option<DateInput>,
    pub max_comments: Option<usize>,
}

/// One entry of `pages`: a page name plus its overrides.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RawPage {
    pub page: String,
    #[serde(flatten)]
    pub overrides: RawOverrides,
}

impl RawPage {
    pub fn named(page: impl Into<String>) -> Self {
        Self { page: page.into(), overrides: RawOverrides::default() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InputFile {
    pub defaults: RawOverrides,
    pub pages: Vec<RawPage>,
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScrapeError::ConfigNotFound(path.to_path_buf()),
        _ => ScrapeError::ConfigMalformed { path: path.to_path_buf(), reason: e.to_string() },
    })
}

fn parse_config<T: serde::de::DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| ScrapeError::ConfigMalformed { path: path.to_path_buf(), reason: e.to_string() })
}

/// Load `{"email": .., "pass": ..}`. Extra keys are ignored.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let text = read_config(path)?;
    parse_config(path, &text)
}

/// Load the batch input: `defaults` and `pages` are required, every page needs `page`.
pub fn load_input(path: &Path) -> Result<InputFile> {
    let text = read_config(path)?;
    parse_config(path, &text)
}

/// Credentials are optional: any failure logs a warning and yields `None`.
pub fn credentials_or_anonymous(path: &Path) -> Option<Credentials> {
    match load_credentials(path) {
        Ok(c) => {
            tracing::info!("Credentials file '{}' found.", path.display());
            Some(c)
        }
        Err(e @ ScrapeError::ConfigNotFound(_)) | Err(e @ ScrapeError::ConfigMalformed { .. }) => {
            tracing::warn!("{e}; attempting connections without credentials.");
            None
        }
        Err(e) => {
            tracing::warn!("could not read credentials: {e}; attempting connections without credentials.");
            None
        }
    }
}

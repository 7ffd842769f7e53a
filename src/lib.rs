mod config;
mod date;
mod error;
mod job;
mod paths;

mod filters;
mod progress;
mod sink;
mod util;
mod pipeline;

pub mod cli;
pub mod interactive;
pub mod source;

pub use crate::config::{
    credentials_or_anonymous, load_credentials, load_input, Credentials, InputFile, RawOverrides, RawPage,
    ScrapeOptions, CSV_HEADER,
};
pub use crate::date::{add_one_month, format_timestamp, parse_ymd, DateInput};
pub use crate::error::{Result, ScrapeError};
pub use crate::job::{resolve_or_fallback, resolve_page_job, PageJob};
pub use crate::pipeline::{PageReport, RunSummary, Scraper};

// Filter-and-flatten stage, for callers streaming rows elsewhere.
pub use crate::filters::{classify, clean_text, flatten_post, OutputRow, Window};

// File naming and the per-page CSV writer.
pub use crate::paths::{name_file, page_stem};
pub use crate::sink::CsvSink;

pub use crate::util::init_tracing_once;

//! Page jobs: a page's resolved date window and comment cap, merged from its
//! own overrides over the collection defaults.

use crate::config::{RawOverrides, RawPage, ScrapeOptions};
use crate::date::{add_one_month, format_ymd, DateInput};
use crate::error::{Result, ScrapeError};
use std::convert::Infallible;
use time::Date;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageJob {
    pub name: String,
    pub max_comments: usize,
    pub start_date: Date, // inclusive
    pub end_date: Date,   // inclusive
}

impl PageJob {
    /// True when no post can fall inside the window.
    pub fn is_empty_window(&self) -> bool {
        self.end_date < self.start_date
    }
}

fn pick<'a, T>(page: &'a Option<T>, defaults: &'a Option<T>) -> Option<&'a T> {
    page.as_ref().or(defaults.as_ref())
}

/// Called for a field that falls back: `None` when the field was not given,
/// the parse error when it was given but unusable. Returning `Err` aborts the
/// merge; `Ok` accepts the fallback (rendered as the third argument).
type OnFallback<'f, E> = dyn FnMut(&str, Option<ScrapeError>, &str) -> std::result::Result<(), E> + 'f;

fn date_field<E>(
    field: &str,
    value: Option<&DateInput>,
    fallback: Date,
    on_fallback: &mut OnFallback<'_, E>,
) -> std::result::Result<Date, E> {
    match value.map(DateInput::resolve) {
        Some(Ok(d)) => Ok(d),
        Some(Err(e)) => on_fallback(field, Some(e), &format_ymd(fallback)).map(|()| fallback),
        None => on_fallback(field, None, &format_ymd(fallback)).map(|()| fallback),
    }
}

// Page field wins, else defaults, else the run constants.
fn merge<E>(
    defaults: &RawOverrides,
    page: &RawPage,
    opts: &ScrapeOptions,
    on_fallback: &mut OnFallback<'_, E>,
) -> std::result::Result<PageJob, E> {
    let ov = &page.overrides;
    let start = pick(&ov.start_date, &defaults.start_date);
    let start_date = date_field("start date", start, opts.fallback_start, on_fallback)?;
    let end = pick(&ov.end_date, &defaults.end_date);
    let end_date = date_field("end date", end, add_one_month(start_date), on_fallback)?;
    let max_comments = match pick(&ov.max_comments, &defaults.max_comments) {
        Some(n) => *n,
        None => {
            on_fallback("max comments", None, &opts.fallback_max_comments.to_string())?;
            opts.fallback_max_comments
        }
    };
    Ok(PageJob { name: page.page.clone(), max_comments, start_date, end_date })
}

/// Strict merge: page field wins, else defaults. A date that fails to parse is
/// returned as an error and the caller picks the fallback.
/// Fields missing from both sides fall back to the run constants.
pub fn resolve_page_job(defaults: &RawOverrides, page: &RawPage, opts: &ScrapeOptions) -> Result<PageJob> {
    merge(defaults, page, opts, &mut |_: &str, err: Option<ScrapeError>, _: &str| err.map_or(Ok(()), Err))
}

/// Lenient merge used by the run: the strict merge, except every bad or
/// missing field degrades to its fallback with a warning, so a page always
/// resolves.
pub fn resolve_or_fallback(defaults: &RawOverrides, page: &RawPage, opts: &ScrapeOptions) -> PageJob {
    let name = page.page.as_str();
    let mut warn = |field: &str, err: Option<ScrapeError>, fallback: &str| -> std::result::Result<(), Infallible> {
        match err {
            Some(e) => tracing::warn!(page = name, "{e}; {field} defaults to {fallback}"),
            None => tracing::warn!(page = name, "no {field} given; defaulting to {fallback}"),
        }
        Ok(())
    };
    let job = match merge(defaults, page, opts, &mut warn) {
        Ok(job) => job,
        Err(never) => match never {},
    };
    warn_if_inverted(&job);
    job
}

// Batch input is not validated for end < start; the job is kept and flagged.
fn warn_if_inverted(job: &PageJob) {
    if job.is_empty_window() {
        tracing::warn!(
            page = %job.name,
            "end date {} precedes start date {}; no posts will match",
            format_ymd(job.end_date),
            format_ymd(job.start_date)
        );
    }
}

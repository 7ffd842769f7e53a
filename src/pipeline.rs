use crate::config::{Credentials, RawOverrides, RawPage, ScrapeOptions};
use crate::date::format_ymd;
use crate::error::{Result, ScrapeError};
use crate::filters::{classify, flatten_post, Window};
use crate::job::{resolve_or_fallback, PageJob};
use crate::progress::PageProgress;
use crate::sink::CsvSink;
use crate::source::{FetchOptions, PostSource};
use crate::util::init_tracing_once;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;

#[derive(Clone, Default)]
pub struct Scraper {
    pub(crate) opts: ScrapeOptions,
    pub(crate) credentials: Option<Credentials>,
}

/// What one page produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageReport {
    pub page: String,
    pub path: PathBuf,
    pub posts_seen: u64,
    pub posts_in_window: u64,
    pub rows: u64,
    /// A post older than the window ended the scan.
    pub stopped_early: bool,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages: Vec<PageReport>,
    pub failed: Vec<(String, ScrapeError)>,
}

impl RunSummary {
    pub fn total_rows(&self) -> u64 {
        self.pages.iter().map(|p| p.rows).sum()
    }
}

impl Scraper {
    pub fn new() -> Self {
        Self { opts: ScrapeOptions::default(), credentials: None }
    }

    // -------- Builder methods --------
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_out_dir(dir); self }
    pub fn page_budget(mut self, pages: u32) -> Self { self.opts = self.opts.with_page_budget(pages); self }
    pub fn posts_per_page(mut self, n: u32) -> Self { self.opts = self.opts.with_posts_per_page(n); self }
    pub fn fallback_start(mut self, start: Date) -> Self { self.opts = self.opts.with_fallback_start(start); self }
    pub fn fallback_max_comments(mut self, n: usize) -> Self { self.opts = self.opts.with_fallback_max_comments(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self { self.credentials = credentials; self }

    pub fn options(&self) -> &ScrapeOptions {
        &self.opts
    }

    /// Merge every page over the defaults, degrading bad fields to constants.
    pub fn resolve_jobs(&self, defaults: &RawOverrides, pages: &[RawPage]) -> Vec<PageJob> {
        pages.iter().map(|p| resolve_or_fallback(defaults, p, &self.opts)).collect()
    }

    /// Scrape one page into a fresh CSV file.
    ///
    /// The file is created (with its header) before the source is asked for
    /// anything, so a failed page still leaves its file behind.
    pub fn scrape_page<S: PostSource>(&self, job: &PageJob, source: &S) -> Result<PageReport> {
        fs::create_dir_all(&self.opts.out_dir)?;
        let mut sink = CsvSink::create_for_page(&self.opts.out_dir, &job.name)?;
        tracing::info!(
            page = %job.name,
            "Now scraping '{}' ({} .. {}, up to {} comments per post) into {}",
            job.name,
            format_ymd(job.start_date),
            format_ymd(job.end_date),
            job.max_comments,
            sink.path().display()
        );

        let options = FetchOptions {
            comments: true,
            posts_per_page: self.opts.posts_per_page,
            comment_limit: Some(job.max_comments),
        };
        let progress = PageProgress::new(&job.name, self.opts.progress);
        let result = self.drain(job, source, &options, &mut sink, &progress);
        progress.finish();

        let (posts_seen, posts_in_window, stopped_early) = result?;
        let rows = sink.rows();
        let path = sink.finish()?;
        Ok(PageReport { page: job.name.clone(), path, posts_seen, posts_in_window, rows, stopped_early })
    }

    fn drain<S: PostSource>(
        &self,
        job: &PageJob,
        source: &S,
        options: &FetchOptions,
        sink: &mut CsvSink,
        progress: &PageProgress,
    ) -> Result<(u64, u64, bool)> {
        let posts = source.fetch(&job.name, self.opts.page_budget, self.credentials.as_ref(), options)?;
        let (mut seen, mut in_window) = (0u64, 0u64);

        for post in posts {
            let post = post?;
            seen += 1;
            progress.update(seen, sink.rows());
            match classify(post.time, job) {
                Window::Before => {
                    tracing::debug!(page = %job.name, post_id = %post.id, "post predates window; stopping");
                    return Ok((seen, in_window, true));
                }
                Window::After => continue,
                Window::Within => {
                    in_window += 1;
                    for row in flatten_post(&post, job.max_comments) {
                        sink.write_row(&row)?;
                    }
                    progress.update(seen, sink.rows());
                }
            }
        }
        Ok((seen, in_window, false))
    }

    /// Scrape pages one at a time, in order. A failing page is logged and
    /// skipped; the run always reaches the last page.
    pub fn run<S: PostSource>(&self, jobs: &[PageJob], source: &S) -> RunSummary {
        init_tracing_once();
        let mut summary = RunSummary::default();
        for job in jobs {
            match self.scrape_page(job, source) {
                Ok(report) => {
                    tracing::info!(
                        page = %report.page,
                        rows = report.rows,
                        posts = report.posts_seen,
                        in_window = report.posts_in_window,
                        "Wrote {}",
                        report.path.display()
                    );
                    summary.pages.push(report);
                }
                Err(e) => {
                    tracing::error!(page = %job.name, "Failed to scrape '{}': {e}", job.name);
                    summary.failed.push((job.name.clone(), e));
                }
            }
        }
        tracing::info!(
            ok = summary.pages.len(),
            failed = summary.failed.len(),
            rows = summary.total_rows(),
            "Done scraping."
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Post, PostStream};
    use time::macros::{date, datetime};

    struct Listed(Vec<Post>);

    impl PostSource for Listed {
        fn fetch<'a>(
            &'a self,
            _page: &str,
            _page_budget: u32,
            _credentials: Option<&'a Credentials>,
            _options: &FetchOptions,
        ) -> Result<PostStream<'a>> {
            Ok(Box::new(self.0.iter().cloned().map(Ok)))
        }
    }

    fn bare(id: &str, time: time::PrimitiveDateTime) -> Post {
        Post { id: id.into(), text: String::new(), time, comments: Vec::new() }
    }

    #[test]
    fn progress_counts_posts_newer_than_window() {
        let dir = tempfile::tempdir().unwrap();
        let job = PageJob {
            name: "p".into(),
            max_comments: 5,
            start_date: date!(2022 - 01 - 01),
            end_date: date!(2022 - 02 - 01),
        };
        let source = Listed(vec![
            bare("a", datetime!(2022-03-01 09:00)),
            bare("b", datetime!(2022-02-20 09:00)),
        ]);
        let scraper = Scraper::new().out_dir(dir.path()).progress(false);
        let mut sink = CsvSink::create_for_page(dir.path(), "p").unwrap();
        let progress = PageProgress::new("p", false);
        let options = FetchOptions::default();

        let (seen, in_window, stopped) = scraper.drain(&job, &source, &options, &mut sink, &progress).unwrap();
        assert_eq!((seen, in_window, stopped), (2, 0, false));
        assert_eq!(progress.counts(), (2, 0));
    }
}

//! Progress reporting: a per-page spinner counting posts scanned and rows written.

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::Cell;

/// Open-ended spinner labeled with the page name.
pub fn make_page_spinner(page: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}  elapsed: {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_prefix(page.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Small wrapper so the pipeline can report whether or not a bar is shown.
pub struct PageProgress {
    pb: Option<ProgressBar>,
    last: Cell<(u64, u64)>,
}

impl PageProgress {
    pub fn new(page: &str, enabled: bool) -> Self {
        Self { pb: enabled.then(|| make_page_spinner(page)), last: Cell::new((0, 0)) }
    }

    #[inline]
    pub fn update(&self, posts: u64, rows: u64) {
        self.last.set((posts, rows));
        if let Some(pb) = &self.pb {
            pb.set_message(format!("{posts} posts scanned, {rows} rows written"));
        }
    }

    /// Last (posts, rows) pair reported, shown or not.
    pub fn counts(&self) -> (u64, u64) {
        self.last.get()
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

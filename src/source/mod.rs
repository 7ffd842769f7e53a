//! Post sources: the one external collaborator. A source turns a page name into
//! a lazy, newest-first sequence of posts with their comments.

mod apify;
mod file;

pub use apify::ApifySource;
pub use file::FileSource;

use crate::config::Credentials;
use crate::error::Result;
use serde::Deserialize;
use time::PrimitiveDateTime;

// Timestamps are naive local times as the page shows them.
time::serde::format_description!(post_time, PrimitiveDateTime, "[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    #[serde(with = "post_time")]
    pub time: PrimitiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    #[serde(with = "post_time")]
    pub time: PrimitiveDateTime,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Request knobs forwarded to the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub comments: bool,
    pub posts_per_page: u32,
    /// Upper bound on comments per post the caller will read; sources may use
    /// it to avoid fetching more.
    pub comment_limit: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { comments: true, posts_per_page: 200, comment_limit: None }
    }
}

/// Lazy post sequence. An `Err` item ends the page.
pub type PostStream<'a> = Box<dyn Iterator<Item = Result<Post>> + 'a>;

/// Fetches a page's posts.
///
/// Implementations must yield posts newest-first: the scraper stops reading a
/// page at the first post older than its window. The stream is finite and is
/// consumed once. Failure to reach the page at all is returned from `fetch`.
pub trait PostSource {
    fn fetch<'a>(
        &'a self,
        page: &str,
        page_budget: u32,
        credentials: Option<&'a Credentials>,
        options: &FetchOptions,
    ) -> Result<PostStream<'a>>;
}

impl<S: PostSource + ?Sized> PostSource for &S {
    fn fetch<'a>(
        &'a self,
        page: &str,
        page_budget: u32,
        credentials: Option<&'a Credentials>,
        options: &FetchOptions,
    ) -> Result<PostStream<'a>> {
        (**self).fetch(page, page_budget, credentials, options)
    }
}

impl<S: PostSource + ?Sized> PostSource for Box<S> {
    fn fetch<'a>(
        &'a self,
        page: &str,
        page_budget: u32,
        credentials: Option<&'a Credentials>,
        options: &FetchOptions,
    ) -> Result<PostStream<'a>> {
        (**self).fetch(page, page_budget, credentials, options)
    }
}

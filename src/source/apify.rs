//! Apify-backed source: runs the Facebook posts actor for a page, then the
//! comments actor for each post as the scraper reaches it.

use super::{Comment, FetchOptions, Post, PostSource, PostStream};
use crate::config::Credentials;
use crate::error::{Result, ScrapeError};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for apify/facebook-posts-scraper.
const FACEBOOK_POSTS_SCRAPER: &str = "KoJrdxJCTtpon81KY";

/// apify/facebook-comments-scraper, addressed by name.
const FACEBOOK_COMMENTS_SCRAPER: &str = "apify~facebook-comments-scraper";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RunData {
    id: String,
    status: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: String,
}

#[derive(Debug, Serialize)]
struct StartUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ScraperInput {
    #[serde(rename = "startUrls")]
    start_urls: Vec<StartUrl>,
    #[serde(rename = "resultsLimit")]
    results_limit: u32,
}

#[derive(Debug, Deserialize)]
struct FacebookPost {
    #[serde(rename = "postId")]
    post_id: Option<String>,
    url: Option<String>,
    text: Option<String>,
    time: Option<String>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FacebookComment {
    id: Option<String>,
    text: Option<String>,
    date: Option<String>,
}

/// Dataset timestamps are UTC; posts are compared as naive UTC times.
/// The ISO field is preferred, the unix one is used when it is missing or
/// unparsable.
fn naive_utc(iso: Option<&str>, unix: Option<i64>) -> Option<PrimitiveDateTime> {
    let dt = iso
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
        .or_else(|| unix.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok()))?;
    let utc = dt.to_offset(UtcOffset::UTC);
    Some(PrimitiveDateTime::new(utc.date(), utc.time()))
}

/// Dated posts, newest first. Rows without a usable time are dropped.
fn dated_posts(page: &str, raw: Vec<FacebookPost>) -> Vec<(FacebookPost, PrimitiveDateTime)> {
    let mut posts: Vec<(FacebookPost, PrimitiveDateTime)> = raw
        .into_iter()
        .filter_map(|p| match naive_utc(p.time.as_deref(), p.timestamp) {
            Some(t) => Some((p, t)),
            None => {
                tracing::debug!(page, post_id = ?p.post_id, time = ?p.time, "dropping post without a usable time");
                None
            }
        })
        .collect();
    // the scraper relies on newest-first order
    posts.sort_by(|a, b| b.1.cmp(&a.1));
    posts
}

/// `resultsLimit` for the comments actor: the job's cap, else the page size.
fn comment_limit(options: &FetchOptions) -> u32 {
    options
        .comment_limit
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(options.posts_per_page)
}

impl FacebookPost {
    /// Posts without an id are identified by their URL.
    fn into_post(self, time: PrimitiveDateTime, comments: Vec<Comment>) -> Post {
        Post {
            id: self.post_id.or(self.url).unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            time,
            comments,
        }
    }
}

fn page_url(page: &str) -> String {
    if page.starts_with("http://") || page.starts_with("https://") {
        page.to_string()
    } else {
        format!("https://www.facebook.com/{}", page.trim_matches('/'))
    }
}

/// Without a token every page fails at fetch time, so the run still visits
/// each page and leaves its header-only file.
pub struct ApifySource {
    client: Client,
    token: Option<String>,
}

impl ApifySource {
    pub fn new(token: Option<String>) -> Result<Self> {
        // waitForFinish long-polls for up to 60s
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ScrapeError::fetch("<client>", e))?;
        Ok(Self { client, token })
    }

    fn token(&self, page: &str) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| ScrapeError::fetch(page, "no Apify API token (set --apify-token or APIFY_TOKEN)"))
    }

    fn check<T: DeserializeOwned>(&self, page: &str, resp: reqwest::blocking::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ScrapeError::fetch(page, format!("API error (status {}): {}", status.as_u16(), body)));
        }
        resp.json().map_err(|e| ScrapeError::fetch(page, format!("parse error: {e}")))
    }

    fn start_run(&self, page: &str, actor: &str, input: &ScraperInput) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", BASE_URL, actor);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token(page)?)
            .json(input)
            .send()
            .map_err(|e| ScrapeError::fetch(page, e))?;
        let api_resp: ApiResponse<RunData> = self.check(page, resp)?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes, long-polling with `waitForFinish=60`.
    fn wait_for_run(&self, page: &str, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", BASE_URL, run_id);
            let resp = self
                .client
                .get(&url)
                .bearer_auth(self.token(page)?)
                .send()
                .map_err(|e| ScrapeError::fetch(page, e))?;
            let api_resp: ApiResponse<RunData> = self.check(page, resp)?;
            match api_resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(api_resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ScrapeError::fetch(page, format!("run {} ended with {}", run_id, api_resp.data.status)));
                }
                _ => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                }
            }
        }
    }

    fn dataset_items<T: DeserializeOwned>(&self, page: &str, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!("{}/datasets/{}/items?format=json&clean=true", BASE_URL, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.token(page)?)
            .send()
            .map_err(|e| ScrapeError::fetch(page, e))?;
        self.check(page, resp)
    }

    fn run_actor<T: DeserializeOwned>(&self, page: &str, actor: &str, input: &ScraperInput) -> Result<Vec<T>> {
        let run = self.start_run(page, actor, input)?;
        tracing::debug!(page, run_id = %run.id, "Apify run started, polling for completion");
        let completed = self.wait_for_run(page, &run.id)?;
        self.dataset_items(page, &completed.default_dataset_id)
    }

    fn comments_for(&self, page: &str, post_url: &str, limit: u32) -> Result<Vec<Comment>> {
        let input = ScraperInput { start_urls: vec![StartUrl { url: post_url.to_string() }], results_limit: limit };
        let raw: Vec<FacebookComment> = self.run_actor(page, FACEBOOK_COMMENTS_SCRAPER, &input)?;
        Ok(raw
            .into_iter()
            .filter_map(|c| {
                let time = naive_utc(c.date.as_deref(), None)?;
                Some(Comment { id: c.id.unwrap_or_default(), text: c.text.unwrap_or_default(), time })
            })
            .collect())
    }
}

impl PostSource for ApifySource {
    fn fetch<'a>(
        &'a self,
        page: &str,
        page_budget: u32,
        credentials: Option<&'a Credentials>,
        options: &FetchOptions,
    ) -> Result<PostStream<'a>> {
        self.token(page)?;
        if credentials.is_some() {
            tracing::debug!(page, "Apify actors scrape public pages; credentials are not forwarded");
        }
        let limit = page_budget.saturating_mul(options.posts_per_page);
        let input = ScraperInput { start_urls: vec![StartUrl { url: page_url(page) }], results_limit: limit };
        tracing::info!(page, limit, "Starting Facebook page scrape");

        let raw: Vec<FacebookPost> = self.run_actor(page, FACEBOOK_POSTS_SCRAPER, &input)?;
        let posts = dated_posts(page, raw);
        tracing::info!(page, count = posts.len(), "Fetched Facebook posts");

        let page = page.to_string();
        let want_comments = options.comments;
        let comment_limit = comment_limit(options);

        Ok(Box::new(posts.into_iter().map(move |(p, time)| {
            let comments = match (&p.url, want_comments && comment_limit > 0) {
                (Some(url), true) => self.comments_for(&page, url, comment_limit)?,
                _ => Vec::new(),
            };
            Ok(p.into_post(time, comments))
        })))
    }
}

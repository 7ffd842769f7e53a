//! Date-window gate and the post→rows flattening step.

use crate::date::{day_start, format_timestamp};
use crate::job::PageJob;
use crate::source::Post;
use serde::Serialize;
use time::PrimitiveDateTime;

/// Where a post falls relative to a page's window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
    /// Older than the start date: nothing further on the page can match.
    Before,
    Within,
    /// Newer than the end date: skip and keep scanning.
    After,
}

/// Bounds are the start of each day, so an end date admits posts up to and
/// including midnight of that day.
pub fn classify(ts: PrimitiveDateTime, job: &PageJob) -> Window {
    if ts < day_start(job.start_date) {
        Window::Before
    } else if ts <= day_start(job.end_date) {
        Window::Within
    } else {
        Window::After
    }
}

/// The sink is line-oriented; embedded newlines become " - ".
pub fn clean_text(s: &str) -> String {
    if !s.contains(['\n', '\r']) {
        return s.to_string();
    }
    s.replace("\r\n", "\n").replace('\r', "\n").replace('\n', " - ")
}

/// One CSV line: a comment alongside the post it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub comment_text: String,
    pub comment_id: String,
    pub comment_time: String,
    pub post_text: String,
    pub post_id: String,
    pub post_time: String,
}

/// Rows for the first `max_comments` comments of `post`.
pub fn flatten_post(post: &Post, max_comments: usize) -> impl Iterator<Item = OutputRow> + '_ {
    let post_text = clean_text(&post.text);
    let post_time = format_timestamp(post.time);
    post.comments.iter().take(max_comments).map(move |c| OutputRow {
        comment_text: clean_text(&c.text),
        comment_id: c.id.clone(),
        comment_time: format_timestamp(c.time),
        post_text: post_text.clone(),
        post_id: post.id.clone(),
        post_time: post_time.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Comment;
    use time::macros::{date, datetime};

    fn job() -> PageJob {
        PageJob {
            name: "p".into(),
            max_comments: 2,
            start_date: date!(2022 - 01 - 01),
            end_date: date!(2022 - 02 - 01),
        }
    }

    #[test]
    fn window_edges() {
        let j = job();
        assert_eq!(classify(datetime!(2021-12-31 23:59:59), &j), Window::Before);
        assert_eq!(classify(datetime!(2022-01-01 00:00:00), &j), Window::Within);
        assert_eq!(classify(datetime!(2022-02-01 00:00:00), &j), Window::Within);
        assert_eq!(classify(datetime!(2022-02-01 00:00:01), &j), Window::After);
    }

    #[test]
    fn newlines_are_flattened() {
        assert_eq!(clean_text("a\nb\r\nc"), "a - b - c");
        assert_eq!(clean_text("plain"), "plain");
    }

    #[test]
    fn comments_are_capped() {
        let post = Post {
            id: "p1".into(),
            text: "hello\nworld".into(),
            time: datetime!(2022-01-20 10:00:00),
            comments: (0..5)
                .map(|i| Comment { id: format!("c{i}"), text: format!("#{i}"), time: datetime!(2022-01-20 11:00:00) })
                .collect(),
        };
        let rows: Vec<_> = flatten_post(&post, 2).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].comment_id, "c0");
        assert_eq!(rows[1].comment_id, "c1");
        assert_eq!(rows[0].post_text, "hello - world");
        assert_eq!(rows[0].post_time, "2022-01-20 10:00:00");
        assert_eq!(flatten_post(&post, 0).count(), 0);
    }
}

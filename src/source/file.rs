use super::{FetchOptions, Post, PostSource, PostStream};
use crate::config::Credentials;
use crate::error::{Result, ScrapeError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Replays posts exported earlier: `<dir>/<page>.json` holds a JSON array of
/// posts with nested comments. Times use "YYYY-MM-DD HH:MM:SS".
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path_for(&self, page: &str) -> PathBuf {
        self.dir.join(format!("{page}.json"))
    }
}

impl PostSource for FileSource {
    fn fetch<'a>(
        &'a self,
        page: &str,
        page_budget: u32,
        _credentials: Option<&'a Credentials>,
        options: &FetchOptions,
    ) -> Result<PostStream<'a>> {
        let path = self.path_for(page);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ScrapeError::fetch(page, format!("no export at {}", path.display())),
            _ => ScrapeError::fetch(page, e),
        })?;
        let mut posts: Vec<Post> = serde_json::from_str(&text)
            .map_err(|e| ScrapeError::fetch(page, format!("{}: {e}", path.display())))?;

        // newest-first, keeping file order among equal times
        posts.sort_by(|a, b| b.time.cmp(&a.time));
        posts.truncate(page_budget.saturating_mul(options.posts_per_page) as usize);

        let want_comments = options.comments;
        let limit = options.comment_limit;
        Ok(Box::new(posts.into_iter().map(move |mut p| {
            if !want_comments {
                p.comments.clear();
            } else if let Some(n) = limit {
                p.comments.truncate(n);
            }
            Ok(p)
        })))
    }
}

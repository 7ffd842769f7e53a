use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Characters that cannot appear in a file name on common platforms.
fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]+"#).unwrap())
}

/// File stem for a page. Plain page names pass through unchanged; URLs and
/// other path-like names have their separators replaced.
pub fn page_stem(page: &str) -> String {
    let stem = unsafe_chars().replace_all(page.trim(), "_");
    if stem.trim_matches('_').is_empty() { "page".to_string() } else { stem.into_owned() }
}

fn candidate(dir: &Path, stem: &str, n: u32) -> PathBuf {
    if n == 0 {
        dir.join(format!("{stem}_comments.csv"))
    } else {
        dir.join(format!("{stem}_comments ({n}).csv"))
    }
}

/// `<page>_comments.csv`, or the first free `<page>_comments (N).csv`.
/// Never returns a path that exists at call time.
pub fn name_file(dir: &Path, page: &str) -> PathBuf {
    let stem = page_stem(page);
    let mut n = 0u32;
    loop {
        let p = candidate(dir, &stem, n);
        if !p.exists() {
            return p;
        }
        n += 1;
    }
}

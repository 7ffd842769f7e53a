use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Apify Facebook actors (needs an API token)
    Apify,
    /// JSON exports in --posts-dir, one `<page>.json` per page
    File,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Scrapes page post comments and stores them as one CSV per page")]
pub struct Args {
    /// Path to the input json
    #[arg(long, default_value = "input.json", num_args = 0..=1, default_missing_value = "input.json")]
    pub input: PathBuf,

    /// Path to the credentials json
    #[arg(long, default_value = "credentials.json", num_args = 0..=1, default_missing_value = "credentials.json")]
    pub cred: PathBuf,

    /// Directory the CSV files are written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Listing pages requested per scraped page
    #[arg(long, default_value_t = 100)]
    pub max_pages: u32,

    /// Page-size hint passed to the source
    #[arg(long, default_value_t = 200)]
    pub posts_per_page: u32,

    #[arg(long, value_enum, default_value_t = SourceKind::Apify)]
    pub source: SourceKind,

    /// Directory of exported posts, for `--source file`
    #[arg(long, required_if_eq("source", "file"))]
    pub posts_dir: Option<PathBuf>,

    #[arg(long, env = "APIFY_TOKEN", hide_env_values = true)]
    pub apify_token: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

/// Accept the single-dash long spellings (`-input`, `-cred`) by rewriting
/// them to their `--` form. `-flag=value` is handled too.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    const LEGACY: [&str; 2] = ["input", "cred"];
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(s) = arg.to_str() else { return arg };
            let Some(rest) = s.strip_prefix('-').filter(|r| !r.starts_with('-')) else { return arg };
            let name = rest.split('=').next().unwrap_or(rest);
            if LEGACY.contains(&name) { OsString::from(format!("-{s}")) } else { arg }
        })
        .collect()
}

impl Args {
    pub fn parse_with_legacy() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(normalize_legacy_flags(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let a = parse(&["pagescrape"]);
        assert_eq!(a.input, PathBuf::from("input.json"));
        assert_eq!(a.cred, PathBuf::from("credentials.json"));
        assert_eq!(a.max_pages, 100);
        assert_eq!(a.posts_per_page, 200);
        assert_eq!(a.source, SourceKind::Apify);
    }

    #[test]
    fn single_dash_long_flags() {
        let a = parse(&["pagescrape", "-input", "pages.json", "-cred=me.json"]);
        assert_eq!(a.input, PathBuf::from("pages.json"));
        assert_eq!(a.cred, PathBuf::from("me.json"));
    }

    #[test]
    fn flag_without_value_uses_default() {
        let a = parse(&["pagescrape", "-input", "-cred", "c.json"]);
        assert_eq!(a.input, PathBuf::from("input.json"));
        assert_eq!(a.cred, PathBuf::from("c.json"));
    }

    #[test]
    fn file_source_requires_dir() {
        let err = Args::try_parse_from(["pagescrape", "--source", "file"]);
        assert!(err.is_err());
        let a = parse(&["pagescrape", "--source", "file", "--posts-dir", "dumps"]);
        assert_eq!(a.posts_dir, Some(PathBuf::from("dumps")));
    }

    #[test]
    fn other_args_untouched() {
        let out = normalize_legacy_flags(["x", "-h", "--input", "a", "-inputs"]);
        assert_eq!(out, vec!["x", "-h", "--input", "a", "-inputs"].into_iter().map(OsString::from).collect::<Vec<_>>());
    }
}

use anyhow::{anyhow, Context, Result};
use pagescrape::cli::{Args, SourceKind};
use pagescrape::interactive::{acquire_pages, LinePrompter, Prompter, TermPrompter};
use pagescrape::source::{ApifySource, FileSource, PostSource};
use pagescrape::{credentials_or_anonymous, init_tracing_once, Scraper};
use std::io::IsTerminal;

fn main() -> Result<()> {
    init_tracing_once();
    let args = Args::parse_with_legacy();

    let scraper = Scraper::new()
        .out_dir(&args.out_dir)
        .page_budget(args.max_pages)
        .posts_per_page(args.posts_per_page)
        .progress(!args.no_progress)
        .credentials(credentials_or_anonymous(&args.cred));

    let source: Box<dyn PostSource> = match args.source {
        SourceKind::Apify => {
            if args.apify_token.is_none() {
                tracing::warn!("No Apify API token (--apify-token or APIFY_TOKEN); every page will fail to fetch.");
            }
            Box::new(ApifySource::new(args.apify_token.clone()).context("building the HTTP client")?)
        }
        SourceKind::File => {
            let dir = args.posts_dir.clone().ok_or_else(|| anyhow!("--posts-dir is required for --source file"))?;
            Box::new(FileSource::new(dir))
        }
    };

    let mut prompter: Box<dyn Prompter> = if std::io::stdin().is_terminal() {
        Box::new(TermPrompter)
    } else {
        Box::new(LinePrompter::stdin())
    };
    let (defaults, pages) = acquire_pages(&args.input, prompter.as_mut(), scraper.options())?;
    if pages.is_empty() {
        tracing::warn!("No pages to scrape.");
    }
    let jobs = scraper.resolve_jobs(&defaults, &pages);
    scraper.run(&jobs, &source);
    Ok(())
}

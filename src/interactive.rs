//! Interactive configuration: collection defaults, then pages until a blank name.

use crate::config::{load_input, RawOverrides, RawPage, ScrapeOptions};
use crate::date::{add_one_month, format_ymd, parse_ymd, DateInput};
use anyhow::Result;
use dialoguer::Input;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::Path;
use time::Date;

/// Line-oriented question/answer channel.
pub trait Prompter {
    fn ask(&mut self, prompt: &str) -> Result<String>;
    fn note(&mut self, msg: &str);
}

/// Terminal prompts via `dialoguer`. Empty answers are allowed.
#[derive(Default)]
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let answer = Input::<String>::new().with_prompt(prompt).allow_empty(true).interact_text()?;
        Ok(answer)
    }

    fn note(&mut self, msg: &str) {
        println!("{msg}");
    }
}

/// Plain line reader for when stdin is not a terminal (piped or redirected
/// answers). Prompts go to stderr; end of input reads as blank answers.
pub struct LinePrompter<R> {
    input: R,
}

impl<R: BufRead> LinePrompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl LinePrompter<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut err = io::stderr();
        write!(err, "{prompt}: ")?;
        err.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn note(&mut self, msg: &str) {
        eprintln!("{msg}");
    }
}

/// Canned answers, for tests. Runs out as blank lines.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { answers: answers.into_iter().map(Into::into).collect(), asked: Vec::new() }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or_default())
    }

    fn note(&mut self, _msg: &str) {}
}

const START_PROMPT: &str = "Start date for scraping (YYYY MM DD)";
const END_PROMPT: &str = "End date for scraping (YYYY MM DD)";
const MAX_PROMPT: &str = "Maximum number of comments";
const PAGE_PROMPT: &str = "Name of page to scrape";

fn parse_end(raw: &str, start: Date) -> std::result::Result<Date, String> {
    let end = parse_ymd(raw).map_err(|e| e.to_string())?;
    if end < start {
        return Err("end date cannot be before start date".to_string());
    }
    Ok(end)
}

fn parse_max(raw: &str) -> std::result::Result<usize, String> {
    let n: i64 = raw.trim().parse().map_err(|_| format!("{raw:?} is not a number"))?;
    usize::try_from(n).map_err(|_| "maximum cannot be negative".to_string())
}

/// Collection defaults. Every answer is required; anything unusable falls
/// back to the run constants with a warning.
pub fn prompt_defaults(p: &mut dyn Prompter, opts: &ScrapeOptions) -> Result<RawOverrides> {
    let start_raw = p.ask(START_PROMPT)?;
    let end_raw = p.ask(END_PROMPT)?;

    let start = parse_ymd(&start_raw).unwrap_or_else(|e| {
        tracing::warn!("{e}; defaulting to {}.", format_ymd(opts.fallback_start));
        opts.fallback_start
    });
    let end = parse_end(&end_raw, start).unwrap_or_else(|reason| {
        let end = add_one_month(start);
        tracing::warn!("Invalid end date ({reason}); defaulting to one month after start, {}.", format_ymd(end));
        end
    });
    let max_raw = p.ask(MAX_PROMPT)?;
    let max_comments = parse_max(&max_raw).unwrap_or_else(|reason| {
        tracing::warn!("Incorrect input ({reason}); defaulting to {} comments.", opts.fallback_max_comments);
        opts.fallback_max_comments
    });

    Ok(RawOverrides {
        start_date: Some(DateInput::Date(start)),
        end_date: Some(DateInput::Date(end)),
        max_comments: Some(max_comments),
    })
}

/// Per-page overrides. A blank answer inherits the default; an unusable one
/// is reported and also inherits.
pub fn prompt_overrides(p: &mut dyn Prompter, page: &str, defaults: &RawOverrides) -> Result<RawOverrides> {
    let start_raw = p.ask(START_PROMPT)?;
    let end_raw = p.ask(END_PROMPT)?;
    let max_raw = p.ask(MAX_PROMPT)?;

    let start = if start_raw.trim().is_empty() {
        None
    } else {
        match parse_ymd(&start_raw) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!(page, "{e}; using the default start date.");
                None
            }
        }
    };

    let effective_start = start.or_else(|| defaults.start_date.as_ref().and_then(|d| d.resolve().ok()));
    let end = if end_raw.trim().is_empty() {
        None
    } else {
        let checked = match effective_start {
            Some(s) => parse_end(&end_raw, s),
            None => parse_ymd(&end_raw).map_err(|e| e.to_string()),
        };
        match checked {
            Ok(d) => Some(d),
            Err(reason) => {
                tracing::warn!(page, "Invalid end date ({reason}); using the default end date.");
                None
            }
        }
    };

    let max_comments = if max_raw.trim().is_empty() {
        None
    } else {
        match parse_max(&max_raw) {
            Ok(n) => Some(n),
            Err(reason) => {
                tracing::warn!(page, "Incorrect input ({reason}); using the default maximum.");
                None
            }
        }
    };

    Ok(RawOverrides {
        start_date: start.map(DateInput::Date),
        end_date: end.map(DateInput::Date),
        max_comments,
    })
}

/// Full interactive session: defaults first, then pages until a blank name.
pub fn collect_pages(p: &mut dyn Prompter, opts: &ScrapeOptions) -> Result<(RawOverrides, Vec<RawPage>)> {
    p.note("\nEnter the default values for the collection.");
    let defaults = prompt_defaults(p, opts)?;

    p.note("\nInput the pages' info.\nEnter a blank page name to stop. Start/end dates and max comments are optional here.");
    let mut pages = Vec::new();
    loop {
        let name = p.ask(PAGE_PROMPT)?;
        let name = name.trim();
        if name.is_empty() {
            break;
        }
        let overrides = prompt_overrides(p, name, &defaults)?;
        pages.push(RawPage { page: name.to_string(), overrides });
    }
    Ok((defaults, pages))
}

/// Batch mode when `input` loads; otherwise the whole configuration is
/// gathered interactively.
pub fn acquire_pages(input: &Path, p: &mut dyn Prompter, opts: &ScrapeOptions) -> Result<(RawOverrides, Vec<RawPage>)> {
    match load_input(input) {
        Ok(file) => {
            tracing::info!("Input file '{}' found.", input.display());
            Ok((file.defaults, file.pages))
        }
        Err(e) if e.is_config_fallback() => {
            tracing::warn!("{e}; defaulting to manual page info entry.");
            collect_pages(p, opts)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn defaults_parse_when_valid() {
        let mut p = ScriptedPrompter::new(["2022 01 01", "2022 02 01", "2"]);
        let d = prompt_defaults(&mut p, &ScrapeOptions::default()).unwrap();
        assert_eq!(d.start_date, Some(DateInput::Date(date!(2022 - 01 - 01))));
        assert_eq!(d.end_date, Some(DateInput::Date(date!(2022 - 02 - 01))));
        assert_eq!(d.max_comments, Some(2));
    }

    #[test]
    fn defaults_fall_back_on_bad_input() {
        let opts = ScrapeOptions::default()
            .with_fallback_start(date!(2021 - 12 - 15))
            .with_fallback_max_comments(7);
        let mut p = ScriptedPrompter::new(["2022 13", "whenever", "-3"]);
        let d = prompt_defaults(&mut p, &opts).unwrap();
        assert_eq!(d.start_date, Some(DateInput::Date(date!(2021 - 12 - 15))));
        assert_eq!(d.end_date, Some(DateInput::Date(date!(2022 - 01 - 15))));
        assert_eq!(d.max_comments, Some(7));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut p = ScriptedPrompter::new(["2022 03 10", "2022 03 01", "5"]);
        let d = prompt_defaults(&mut p, &ScrapeOptions::default()).unwrap();
        assert_eq!(d.end_date, Some(DateInput::Date(date!(2022 - 04 - 10))));
    }

    #[test]
    fn session_collects_pages_until_blank() {
        let mut p = ScriptedPrompter::new([
            "2022 01 01", "2022 02 01", "10", // defaults
            "first", "", "", "",              // inherits everything
            "second", "2022 01 15", "2022 01 10", "3", // end before page start
            "",
        ]);
        let (defaults, pages) = collect_pages(&mut p, &ScrapeOptions::default()).unwrap();
        assert_eq!(defaults.max_comments, Some(10));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], RawPage::named("first"));
        assert_eq!(pages[1].page, "second");
        assert_eq!(pages[1].overrides.start_date, Some(DateInput::Date(date!(2022 - 01 - 15))));
        assert_eq!(pages[1].overrides.end_date, None);
        assert_eq!(pages[1].overrides.max_comments, Some(3));
        assert_eq!(p.asked.last().map(String::as_str), Some(PAGE_PROMPT));
    }

    #[test]
    fn piped_answers_drive_a_session() {
        let piped = "2022 01 01\n2022 02 01\n5\npg\n\n\n\n";
        let mut p = LinePrompter::new(std::io::Cursor::new(piped));
        let (defaults, pages) = collect_pages(&mut p, &ScrapeOptions::default()).unwrap();
        assert_eq!(defaults.start_date, Some(DateInput::Date(date!(2022 - 01 - 01))));
        assert_eq!(defaults.max_comments, Some(5));
        // input ran out where the blank page name would be
        assert_eq!(pages, vec![RawPage::named("pg")]);
    }

    #[test]
    fn exhausted_input_reads_as_blank() {
        let mut p = LinePrompter::new(std::io::Cursor::new("only\r\n"));
        assert_eq!(p.ask(PAGE_PROMPT).unwrap(), "only");
        assert_eq!(p.ask(PAGE_PROMPT).unwrap(), "");
        assert_eq!(p.ask(PAGE_PROMPT).unwrap(), "");
    }

    #[test]
    fn batch_file_skips_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        std::fs::write(&input, r#"{"defaults": {"max_comments": 4}, "pages": [{"page": "a"}]}"#).unwrap();
        let mut p = ScriptedPrompter::default();
        let (defaults, pages) = acquire_pages(&input, &mut p, &ScrapeOptions::default()).unwrap();
        assert_eq!(defaults.max_comments, Some(4));
        assert_eq!(pages, vec![RawPage::named("a")]);
        assert!(p.asked.is_empty());
    }

    #[test]
    fn malformed_file_falls_back_to_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        std::fs::write(&input, r#"{"pages": []}"#).unwrap();
        let mut p = ScriptedPrompter::new(["2022 01 01", "2022 02 01", "1", "only", "", "", "", ""]);
        let (_, pages) = acquire_pages(&input, &mut p, &ScrapeOptions::default()).unwrap();
        assert_eq!(pages, vec![RawPage::named("only")]);
        assert!(!p.asked.is_empty());
    }
}

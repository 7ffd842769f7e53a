#![allow(dead_code)]

use pagescrape::source::{Comment, FetchOptions, Post, PostSource, PostStream};
use pagescrape::{Credentials, ScrapeError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use time::{Date, PrimitiveDateTime, Time};

/// One scripted item of a page's post stream.
#[derive(Clone, Debug)]
pub enum Step {
    Post(Post),
    Fail(&'static str),
}

/// In-memory source. Yields steps in the order given (callers script them
/// newest-first) and counts how many items the scraper actually pulled.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<String, Vec<Step>>,
    pub pulled: Cell<usize>,
    pub fetched_pages: RefCell<Vec<String>>,
    pub saw_credentials: Cell<bool>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, name: &str, steps: Vec<Step>) -> Self {
        self.pages.insert(name.to_string(), steps);
        self
    }
}

impl PostSource for ScriptedSource {
    fn fetch<'a>(
        &'a self,
        page: &str,
        _page_budget: u32,
        credentials: Option<&'a Credentials>,
        _options: &FetchOptions,
    ) -> pagescrape::Result<PostStream<'a>> {
        self.fetched_pages.borrow_mut().push(page.to_string());
        self.saw_credentials.set(credentials.is_some());
        let steps = self
            .pages
            .get(page)
            .cloned()
            .ok_or_else(|| ScrapeError::fetch(page, "page not found"))?;
        let page = page.to_string();
        Ok(Box::new(steps.into_iter().map(move |s| {
            self.pulled.set(self.pulled.get() + 1);
            match s {
                Step::Post(p) => Ok(p),
                Step::Fail(msg) => Err(ScrapeError::fetch(page.clone(), msg)),
            }
        })))
    }
}

pub fn at(date: Date, hour: u8) -> PrimitiveDateTime {
    PrimitiveDateTime::new(date, Time::from_hms(hour, 0, 0).unwrap())
}

/// A post with `n` comments timestamped an hour after it.
pub fn post(id: &str, date: Date, n: usize) -> Step {
    let time = at(date, 10);
    let comments = (0..n)
        .map(|i| Comment { id: format!("{id}-c{i}"), text: format!("comment {i} on {id}"), time: at(date, 11) })
        .collect();
    Step::Post(Post { id: id.to_string(), text: format!("text of {id}"), time, comments })
}

/// Parse a CSV file into records (header included).
pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_path(path).unwrap();
    rdr.records().map(|r| r.unwrap().iter().map(str::to_string).collect()).collect()
}

pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    BufReader::new(f).lines().map(|l| l.unwrap()).collect()
}

//! Per-page CSV writer: header first, then one flushed line per row.

use crate::config::CSV_HEADER;
use crate::error::{Result, ScrapeError};
use crate::filters::OutputRow;
use crate::paths::name_file;
use crate::util::create_new_with_backoff;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub struct CsvSink {
    path: PathBuf,
    w: csv::Writer<File>,
    rows: u64,
}

impl CsvSink {
    /// Create `path` (which must not exist) and write the header.
    pub fn create(path: &Path) -> Result<Self> {
        let f = create_new_with_backoff(path, 16, 50)?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(f);
        w.write_record(CSV_HEADER)?;
        w.flush()?;
        Ok(Self { path: path.to_path_buf(), w, rows: 0 })
    }

    /// Pick a free `<page>_comments*.csv` name in `dir` and create it.
    /// Retries with the next name if another process takes it first.
    pub fn create_for_page(dir: &Path, page: &str) -> Result<Self> {
        for _ in 0..8 {
            match Self::create(&name_file(dir, page)) {
                Err(ScrapeError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                other => return other,
            }
        }
        Err(ScrapeError::Io(io::Error::new(io::ErrorKind::AlreadyExists, format!("no free file name for '{page}'"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        self.w.serialize(row)?;
        self.w.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.w.flush()?;
        Ok(self.path)
    }
}

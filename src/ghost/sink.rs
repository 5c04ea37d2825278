//! CSV output for accepted leads

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::{debug, info};

use crate::error::ScraperError;

use super::types::{AcceptedLead, LEAD_COLUMNS};

/// Append-only CSV writer. Every row is flushed before returning so a killed
/// run keeps what it found.
///
/// Records are encoded into a scratch buffer first and reach the output in a
/// single write, so a failed row leaves nothing behind to be flushed later.
pub struct ResultSink<W: Write = File> {
    out: W,
    path: PathBuf,
    rows: usize,
    header_written: bool,
}

impl ResultSink<File> {
    /// Truncate `path` and write the lead header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let sink = Self::from_writer(file, path)?;
        info!("Output file opened: {:?}", sink.path);
        Ok(sink)
    }
}

impl<W: Write> ResultSink<W> {
    /// Wrap an open writer; `path` is only used in log lines.
    pub fn from_writer(out: W, path: impl Into<PathBuf>) -> Result<Self, ScraperError> {
        let mut sink = Self {
            out,
            path: path.into(),
            rows: 0,
            header_written: false,
        };
        sink.write_header(&LEAD_COLUMNS)?;
        Ok(sink)
    }

    /// Writes the header once; later calls are ignored.
    pub fn write_header(&mut self, columns: &[&str]) -> Result<(), ScraperError> {
        if self.header_written {
            debug!("header already written, skipping");
            return Ok(());
        }
        self.append(columns)?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_row(&mut self, fields: &[&str]) -> Result<(), ScraperError> {
        self.append(fields)?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_lead(&mut self, lead: &AcceptedLead) -> Result<(), ScraperError> {
        self.write_row(&lead.fields())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn append(&mut self, fields: &[&str]) -> Result<(), ScraperError> {
        let mut encoder = Writer::from_writer(Vec::new());
        encoder.write_record(fields)?;
        let line = encoder.into_inner().map_err(|e| e.into_error())?;

        self.out.write_all(&line)?;
        self.out.flush()?;
        Ok(())
    }

    /// Flush and close the output, returning the number of data rows.
    pub fn finish(mut self) -> Result<usize, ScraperError> {
        self.out.flush()?;
        info!("Output file closed: {:?} ({} rows)", self.path, self.rows);
        Ok(self.rows)
    }
}

//! Run-wide shared state: dedup registry, accepted counter, output sink

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ScraperError;

use super::sink::ResultSink;
use super::types::AcceptedLead;

/// Names already accepted (or excluded) in this run. Comparison ignores case
/// and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct DedupRegistry {
    names: HashSet<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&Self::key(name))
    }

    /// Returns `false` when the name was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(Self::key(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Seed from a CSV of previously contacted businesses (name in the first column).
    pub fn load_exclusions(&mut self, path: impl AsRef<Path>) -> Result<usize, ScraperError> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        // byte records: a non-UTF-8 row must not end the load
        let mut added = 0;
        for (line, record) in reader.byte_records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    warn!("Stopped reading exclusions at line {}: {}", line + 1, e);
                    break;
                }
                Err(e) => {
                    debug!("Skipping exclusion line {}: {}", line + 1, e);
                    continue;
                }
            };
            let Some(field) = record.get(0) else {
                continue;
            };
            let name = String::from_utf8_lossy(field);
            let name = name.trim();
            if !name.is_empty() && self.insert(name) {
                added += 1;
            }
        }
        info!("Loaded {} exclusions from {:?}", added, path);
        Ok(added)
    }
}

/// Result of trying to commit an accepted lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Row written; carries the new accepted count.
    Written(usize),
    Duplicate,
    TargetReached,
}

struct Ledger {
    registry: DedupRegistry,
    sink: Option<ResultSink>,
}

/// Shared by the scheduler and every query task.
///
/// The counter is readable without locking for early-exit polling; all
/// mutations go through [`GlobalProgress::commit_acceptance`].
pub struct GlobalProgress {
    target: usize,
    accepted: AtomicUsize,
    ledger: Mutex<Ledger>,
}

impl GlobalProgress {
    pub fn new(target: usize, registry: DedupRegistry, sink: ResultSink) -> Self {
        Self {
            target,
            accepted: AtomicUsize::new(0),
            ledger: Mutex::new(Ledger {
                registry,
                sink: Some(sink),
            }),
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Acquire)
    }

    pub fn target_reached(&self) -> bool {
        self.accepted() >= self.target
    }

    pub async fn is_known(&self, name: &str) -> bool {
        self.ledger.lock().await.registry.contains(name)
    }

    /// Target check, dedup check-and-insert, row append and counter increment
    /// as one critical section.
    pub async fn commit_acceptance(&self, lead: &AcceptedLead) -> Result<Commit, ScraperError> {
        let mut ledger = self.ledger.lock().await;

        if self.accepted.load(Ordering::Acquire) >= self.target {
            return Ok(Commit::TargetReached);
        }
        if ledger.registry.contains(&lead.name) {
            debug!("duplicate at commit: {}", lead.name);
            return Ok(Commit::Duplicate);
        }

        let sink = ledger.sink.as_mut().ok_or(ScraperError::SinkClosed)?;
        sink.write_lead(lead)?;
        ledger.registry.insert(&lead.name);

        let count = self.accepted.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(Commit::Written(count))
    }

    /// Close the sink. Later commits fail with [`ScraperError::SinkClosed`].
    pub async fn close(&self) -> Result<usize, ScraperError> {
        let sink = self.ledger.lock().await.sink.take();
        match sink {
            Some(sink) => sink.finish(),
            None => Ok(self.accepted()),
        }
    }
}

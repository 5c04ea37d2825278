//! Fans query units out under a concurrency cap until the target is met

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::LeadConfig;
use crate::error::ScraperError;
use crate::traits::RenderClient;

use super::registry::{DedupRegistry, GlobalProgress};
use super::sink::ResultSink;
use super::task::{QueryOutcome, QueryTask};
use super::types::QueryUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub accepted: usize,
    pub total_units: usize,
    pub launched: usize,
    /// Units never searched because the target was already met.
    pub skipped: usize,
    pub abandoned: usize,
    /// Tasks that panicked.
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

pub struct Scheduler<C: RenderClient> {
    client: Arc<C>,
    config: Arc<LeadConfig>,
}

impl<C: RenderClient + 'static> Scheduler<C> {
    pub fn new(client: Arc<C>, config: Arc<LeadConfig>) -> Self {
        Self { client, config }
    }

    /// Search every category x location pair in random order with at most
    /// `concurrency` searches in flight, stopping new work once `target`
    /// leads are written.
    pub async fn run(
        &self,
        categories: &[String],
        locations: &[String],
        target: usize,
        concurrency: usize,
    ) -> Result<RunSummary, ScraperError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut units = QueryUnit::cross_product(categories, locations);
        self.shuffle(&mut units);
        let total_units = units.len();

        let mut registry = DedupRegistry::new();
        if let Some(path) = &self.config.exclusions_path {
            if let Err(e) = registry.load_exclusions(path) {
                warn!("Could not load exclusions from {:?}: {}", path, e);
            }
        }

        let sink = ResultSink::create(&self.config.output_path)?;
        let progress = Arc::new(GlobalProgress::new(target, registry, sink));
        let gate = Arc::new(Semaphore::new(concurrency.max(1)));

        info!(
            "Starting run: {} queries, target={}, concurrency={}",
            total_units, target, concurrency
        );

        let mut tasks = JoinSet::new();
        let mut launched = 0;
        for unit in units {
            let Ok(permit) = gate.clone().acquire_owned().await else {
                break;
            };
            if progress.target_reached() {
                break;
            }

            let task = QueryTask::new(self.client.clone(), progress.clone(), self.config.clone());
            tasks.spawn(async move {
                let _permit = permit;
                task.run(unit).await
            });
            launched += 1;
        }

        let mut skipped = total_units - launched;
        let mut abandoned = 0;
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(QueryOutcome::Skipped) => skipped += 1,
                Ok(QueryOutcome::Abandoned(_)) => abandoned += 1,
                Ok(QueryOutcome::Completed(_)) => {}
                Err(e) => {
                    warn!("Query task failed: {}", e);
                    failed += 1;
                }
            }
        }

        if let Err(e) = progress.close().await {
            warn!("Failed to close output file: {}", e);
        }

        let summary = RunSummary {
            accepted: progress.accepted(),
            total_units,
            launched,
            skipped,
            abandoned,
            failed,
            started_at,
            elapsed: start.elapsed(),
        };

        info!(
            "Finished. Saved {} leads to {:?} ({} searched, {} skipped, {} abandoned) in {:.2}s",
            summary.accepted,
            self.config.output_path,
            summary.launched,
            summary.skipped,
            summary.abandoned,
            summary.elapsed.as_secs_f64()
        );

        Ok(summary)
    }

    fn shuffle(&self, units: &mut [QueryUnit]) {
        match self.config.seed {
            Some(seed) => units.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => units.shuffle(&mut rand::rng()),
        }
    }
}

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::config::LeadConfig;
use crate::error::ScraperError;
use crate::ghost::{RunSummary, Scheduler};
use crate::traits::RenderClient;

/// One lead-finding run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    pub target: usize,
    pub concurrency: usize,
}

impl RunRequest {
    pub fn new(categories: Vec<String>, locations: Vec<String>) -> Self {
        let defaults = LeadConfig::default();
        Self {
            categories,
            locations,
            target: defaults.target,
            concurrency: defaults.concurrency,
        }
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

impl From<&LeadConfig> for RunRequest {
    fn from(config: &LeadConfig) -> Self {
        Self {
            categories: config.categories.clone(),
            locations: config.locations.clone(),
            target: config.target,
            concurrency: config.concurrency,
        }
    }
}

/// tower::Service running the whole search pipeline against one render client.
pub struct LeadFinderService<C: RenderClient> {
    client: Arc<C>,
    config: Arc<LeadConfig>,
}

impl<C: RenderClient> LeadFinderService<C> {
    pub fn new(client: Arc<C>, config: LeadConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

impl<C: RenderClient> Clone for LeadFinderService<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: RenderClient + 'static> Service<RunRequest> for LeadFinderService<C> {
    type Response = RunSummary;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RunRequest) -> Self::Future {
        info!(
            "Run requested: {} categories x {} locations, target={}",
            req.categories.len(),
            req.locations.len(),
            req.target
        );

        let scheduler = Scheduler::new(self.client.clone(), self.config.clone());
        Box::pin(async move {
            scheduler
                .run(&req.categories, &req.locations, req.target, req.concurrency)
                .await
        })
    }
}

//! One (category, location) search driven end to end

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LeadConfig;
use crate::error::ScraperError;
use crate::traits::{RenderClient, ResultEntry, Surface};

use super::extractor::{
    email_search_url, entry_name, search_email, ResultExtractor, CONSENT_SELECTOR, ENTRY_SELECTOR,
    FEED_SELECTOR,
};
use super::filter::{check_phone, check_website, is_personal_email, qualify, Decision, Rejection};
use super::registry::{Commit, GlobalProgress};
use super::types::{AcceptedLead, CandidateRecord, Email, QueryUnit};

/// Directory search URL for a unit: the search term form-encoded onto `base`.
pub fn search_url(base: &str, unit: &QueryUnit) -> String {
    let query: String =
        url::form_urlencoded::byte_serialize(unit.search_term().as_bytes()).collect();
    format!("{}{}", base, query)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStats {
    pub seen: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Target already met before the search started.
    Skipped,
    /// Setup failed (surface, navigation, listing enumeration).
    Abandoned(String),
    Completed(EntryStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Empty,
    Duplicate,
    Rejected(Rejection),
    Accepted(usize),
    TargetReached,
}

pub struct QueryTask<C: RenderClient> {
    client: Arc<C>,
    progress: Arc<GlobalProgress>,
    config: Arc<LeadConfig>,
    extractor: ResultExtractor,
}

impl<C: RenderClient> QueryTask<C> {
    pub fn new(client: Arc<C>, progress: Arc<GlobalProgress>, config: Arc<LeadConfig>) -> Self {
        let extractor = ResultExtractor::new(config.social_ghost_domains.clone());
        Self {
            client,
            progress,
            config,
            extractor,
        }
    }

    /// Run the search. Never fails: errors degrade to an abandoned unit or a
    /// skipped entry.
    pub async fn run(&self, unit: QueryUnit) -> QueryOutcome {
        if self.progress.target_reached() {
            return QueryOutcome::Skipped;
        }

        info!("Searching: {}...", unit);

        let surface = match self.client.new_surface().await {
            Ok(surface) => surface,
            Err(e) => {
                warn!("Error searching {}: {}", unit, e);
                return QueryOutcome::Abandoned(e.to_string());
            }
        };

        let outcome = match self.search(&surface, &unit).await {
            Ok(stats) => {
                debug!("{} done: {:?}", unit, stats);
                QueryOutcome::Completed(stats)
            }
            Err(e) => {
                warn!("Error searching {}: {}", unit, e);
                self.capture_screenshot(&surface, &unit).await;
                QueryOutcome::Abandoned(e.to_string())
            }
        };

        if let Err(e) = surface.close().await {
            debug!("Failed to close surface for {}: {}", unit, e);
        }

        outcome
    }

    async fn search(&self, surface: &C::Surface, unit: &QueryUnit) -> Result<EntryStats, ScraperError> {
        surface.goto(&search_url(&self.config.search_base_url, unit)).await?;

        match surface.click(CONSENT_SELECTOR).await {
            Ok(true) => {
                debug!("Consent dialog dismissed");
                sleep(self.config.timing.settle()).await;
            }
            Ok(false) => {}
            Err(e) => debug!("Consent check failed: {}", e),
        }

        self.load_feed(surface, unit).await;

        let entries = surface.entries(ENTRY_SELECTOR).await?;
        debug!("{}: {} listings rendered", unit, entries.len());

        let mut stats = EntryStats::default();
        for entry in &entries {
            if self.progress.target_reached() {
                break;
            }
            stats.seen += 1;

            match self.process_entry(surface, entry, unit).await {
                Ok(EntryOutcome::Accepted(_)) => stats.accepted += 1,
                Ok(EntryOutcome::Rejected(reason)) => {
                    debug!("rejected ({})", reason);
                    stats.rejected += 1;
                }
                Ok(EntryOutcome::Duplicate) => stats.duplicates += 1,
                Ok(EntryOutcome::Empty) => {}
                Ok(EntryOutcome::TargetReached) => break,
                Err(e) => {
                    debug!("Skipping listing in {}: {}", unit, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Wait briefly for the results feed and scroll it to trigger lazy loading.
    /// A missing feed is not an error: whatever is rendered gets processed.
    async fn load_feed(&self, surface: &C::Surface, unit: &QueryUnit) {
        let timing = &self.config.timing;

        if let Err(e) = surface.wait_for(FEED_SELECTOR, timing.feed_wait()).await {
            if e.is_timeout() {
                debug!("No results feed for {} within {}ms", unit, timing.feed_wait_ms);
            } else {
                debug!("Results feed lookup failed for {}: {}", unit, e);
            }
            return;
        }

        for round in 0..timing.scroll_rounds {
            if self.progress.target_reached() {
                break;
            }
            if let Err(e) = surface.scroll_by(FEED_SELECTOR, timing.scroll_distance).await {
                debug!("Scroll {} failed for {}: {}", round + 1, unit, e);
                break;
            }
            sleep(timing.scroll_pause()).await;
        }
    }

    async fn process_entry(
        &self,
        surface: &C::Surface,
        entry: &<C::Surface as Surface>::Entry,
        unit: &QueryUnit,
    ) -> Result<EntryOutcome, ScraperError> {
        let text = entry.text().await?;
        let Some(name) = entry_name(&text) else {
            return Ok(EntryOutcome::Empty);
        };

        if self.progress.is_known(&name).await {
            return Ok(EntryOutcome::Duplicate);
        }

        let website = self.extractor.website(entry).await;
        if let Err(reason) = check_website(website.is_present()) {
            return Ok(EntryOutcome::Rejected(reason));
        }

        // open the details pane
        if let Err(e) = entry.click().await {
            debug!("Click on {} failed: {}", name, e);
        }
        sleep(self.config.timing.settle()).await;

        let phone = self.extractor.phone(surface).await;
        if let Err(reason) = check_phone(&phone) {
            return Ok(EntryOutcome::Rejected(reason));
        }

        let mut email = self.extractor.email(surface).await;
        if email == Email::NotFound && self.config.email_search.enabled {
            let url = email_search_url(&self.config.email_search.base_url, &name, &unit.location);
            email = search_email(self.client.as_ref(), &url).await;
        }
        let email_validated = is_personal_email(&email, &self.config.filter);

        let candidate = CandidateRecord {
            name,
            website,
            phone,
            email,
            email_validated,
            source: unit.clone(),
        };

        if let Decision::Reject(reason) = qualify(&candidate, &self.config.filter) {
            return Ok(EntryOutcome::Rejected(reason));
        }

        let lead = AcceptedLead::assemble(&candidate, &self.config.placeholders);
        match self.progress.commit_acceptance(&lead).await? {
            Commit::Written(count) => {
                info!(
                    "[+] FOUND GHOST #{}: {} | {} | {}{}",
                    count,
                    lead.name,
                    lead.phone,
                    lead.email,
                    if candidate.email_validated { "" } else { " (unverified email)" }
                );
                Ok(EntryOutcome::Accepted(count))
            }
            Commit::Duplicate => Ok(EntryOutcome::Duplicate),
            Commit::TargetReached => Ok(EntryOutcome::TargetReached),
        }
    }

    async fn capture_screenshot(&self, surface: &C::Surface, unit: &QueryUnit) {
        if !self.config.debug {
            return;
        }
        match surface.screenshot().await {
            Ok(png) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
                debug!("{} screenshot: data:image/png;base64,{}", unit, encoded);
            }
            Err(e) => debug!("Screenshot failed: {}", e),
        }
    }
}

//! Ghost lead scraper
//!
//! - Searches a map directory for every category x location pair
//! - Keeps small businesses with a listed phone and no website
//! - Appends them to a CSV as they are found
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ghost_lead_scraper::{ChromiumClient, LeadConfig, LeadFinderService, RunRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LeadConfig::new(vec!["Plumbing".into()], vec!["Texas".into()])
//!         .with_output_path("./ghost_leads.csv")
//!         .with_target(50)
//!         .with_concurrency(5);
//!
//!     let client = Arc::new(ChromiumClient::launch(&config).await.unwrap());
//!     let mut service = LeadFinderService::new(client, config.clone());
//!
//!     let summary = service.call(RunRequest::from(&config)).await.unwrap();
//!     println!("Leads saved: {}", summary.accepted);
//! }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod ghost;
pub mod service;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::ChromiumClient;
pub use config::{EmailSearch, FilterPolicy, LeadConfig, Placeholders, ReviewBand, Timing};
pub use error::ScraperError;
pub use ghost::{AcceptedLead, CandidateRecord, QueryUnit, RunSummary, Scheduler};
pub use service::{LeadFinderService, RunRequest};
pub use traits::{RenderClient, ResultEntry, Surface};

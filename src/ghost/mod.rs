//! Ghost lead pipeline
//!
//! Searches the map directory for every category x location pair and keeps
//! listings that have a phone number but no website.

mod extractor;
mod filter;
mod registry;
mod scheduler;
mod sink;
mod task;
mod types;

pub use extractor::{
    email_search_url, entry_name, find_email, find_email_in_snippet, phone_from_label,
    search_email, ResultExtractor, CONSENT_SELECTOR, DETAILS_SELECTOR, ENTRY_SELECTOR,
    FEED_SELECTOR, PHONE_SELECTOR, SNIPPET_SELECTOR, WEBSITE_SELECTOR,
};
pub use filter::{check_phone, check_website, is_personal_email, qualify, Decision, Rejection};
pub use registry::{Commit, DedupRegistry, GlobalProgress};
pub use scheduler::{RunSummary, Scheduler};
pub use sink::ResultSink;
pub use task::{search_url, EntryOutcome, EntryStats, QueryOutcome, QueryTask};
pub use types::{
    AcceptedLead, CandidateRecord, Email, Phone, QueryUnit, Website, LEAD_COLUMNS,
};

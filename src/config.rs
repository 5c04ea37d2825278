use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

const DEFAULT_CATEGORIES: &[&str] = &[
    "Home Remodeling",
    "Roofing Contractor",
    "Solar Company",
    "HVAC Service",
    "Plumbing",
    "MedSpa clinic",
    "Fitness Coach",
    "Pest Control",
];

const DEFAULT_LOCATIONS: &[&str] = &[
    "Texas",
    "Florida",
    "California",
    "Arizona",
    "Georgia",
    "North Carolina",
    "Washington",
    "Illinois",
    "Ohio",
    "London",
    "Dubai",
    "Sydney",
];

const DEFAULT_PERSONAL_EMAIL_DOMAINS: &[&str] = &[
    "@gmail.com",
    "@yahoo.com",
    "@hotmail.com",
    "@outlook.com",
    "@icloud.com",
    "@aol.com",
];

/// Run configuration. Every field has a default so partial JSON files work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadConfig {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    pub output_path: PathBuf,
    /// Number of accepted leads after which the run stops.
    pub target: usize,
    /// Maximum number of query tasks active at once.
    pub concurrency: usize,
    /// Fixed seed for the query shuffle; random when unset.
    pub seed: Option<u64>,
    pub search_base_url: String,
    /// Declared review-count band. Not applied by the filter.
    pub review_band: ReviewBand,
    pub filter: FilterPolicy,
    pub email_search: EmailSearch,
    pub placeholders: Placeholders,
    /// Hosts whose links still count as "no website" (social profiles and the like).
    pub social_ghost_domains: Vec<String>,
    /// CSV of already-contacted businesses; the first column is the name.
    pub exclusions_path: Option<PathBuf>,
    pub timing: Timing,
    pub headless: bool,
    pub debug: bool,
    pub chrome_path: Option<String>,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            locations: DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect(),
            output_path: PathBuf::from("ghost_leads.csv"),
            target: 1500,
            concurrency: 15,
            seed: None,
            search_base_url: "https://www.google.com/maps/search/".to_string(),
            review_band: ReviewBand::default(),
            filter: FilterPolicy::default(),
            email_search: EmailSearch::default(),
            placeholders: Placeholders::default(),
            social_ghost_domains: Vec::new(),
            exclusions_path: None,
            timing: Timing::default(),
            headless: true,
            debug: false,
            chrome_path: None,
        }
    }
}

impl LeadConfig {
    pub fn new(categories: Vec<String>, locations: Vec<String>) -> Self {
        Self {
            categories,
            locations,
            ..Default::default()
        }
    }

    /// Load a JSON config file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| ScraperError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.concurrency == 0 {
            return Err(ScraperError::Config("concurrency must be at least 1".into()));
        }
        if self.search_base_url.is_empty() {
            return Err(ScraperError::Config("search_base_url is empty".into()));
        }
        if self.email_search.enabled && self.email_search.base_url.is_empty() {
            return Err(ScraperError::Config("email_search.base_url is empty".into()));
        }
        Ok(())
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_require_validated_email(mut self, require: bool) -> Self {
        self.filter.require_validated_email = require;
        self
    }

    pub fn with_email_search(mut self, enabled: bool) -> Self {
        self.email_search.enabled = enabled;
        self
    }

    pub fn with_exclusions_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclusions_path = Some(path.into());
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBand {
    pub min: u32,
    pub max: u32,
}

impl Default for ReviewBand {
    fn default() -> Self {
        Self { min: 5, max: 200 }
    }
}

/// Qualification policy on top of the fixed website / phone gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    /// Reject candidates whose email is not on a personal provider domain.
    /// Off by default: the provider check is only reported.
    pub require_validated_email: bool,
    pub personal_email_domains: Vec<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            require_validated_email: false,
            personal_email_domains: DEFAULT_PERSONAL_EMAIL_DOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Web search for listings whose details pane shows no email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSearch {
    /// Costs one extra page load per qualifying listing.
    pub enabled: bool,
    /// Query string is appended form-encoded.
    pub base_url: String,
}

impl Default for EmailSearch {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://www.google.com/search?q=".to_string(),
        }
    }
}

/// Output columns that are not read from the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    /// Fixed Address value. `None` writes the query location instead.
    pub address: Option<String>,
    pub no_website: String,
    pub reviews: String,
    pub rating: String,
    pub instagram: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            address: None,
            no_website: "No Website".to_string(),
            reviews: "10-200".to_string(),
            rating: "4.5".to_string(),
            instagram: "Check Social".to_string(),
        }
    }
}

/// Waits and pagination budget for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub feed_wait_ms: u64,
    pub scroll_rounds: u32,
    pub scroll_distance: u32,
    pub scroll_pause_ms: u64,
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            feed_wait_ms: 4000,
            scroll_rounds: 5,
            scroll_distance: 1500,
            scroll_pause_ms: 800,
            settle_ms: 500,
            poll_interval_ms: 100,
        }
    }
}

impl Timing {
    /// No pauses at all; used when the backend renders synchronously.
    pub fn immediate() -> Self {
        Self {
            feed_wait_ms: 0,
            scroll_pause_ms: 0,
            settle_ms: 0,
            poll_interval_ms: 0,
            ..Default::default()
        }
    }

    pub fn feed_wait(&self) -> Duration {
        Duration::from_millis(self.feed_wait_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LeadConfig::new(vec!["Plumbing".into()], vec!["Texas".into()])
            .with_output_path("/tmp/out.csv")
            .with_target(10)
            .with_concurrency(3)
            .with_seed(7)
            .with_headless(false)
            .with_require_validated_email(true)
            .with_email_search(true);

        assert_eq!(config.categories, vec!["Plumbing".to_string()]);
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.target, 10);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.seed, Some(7));
        assert!(!config.headless);
        assert!(config.filter.require_validated_email);
        assert!(config.email_search.enabled);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LeadConfig =
            serde_json::from_str(r#"{"target": 50, "timing": {"scroll_rounds": 2}}"#).unwrap();

        assert_eq!(config.target, 50);
        assert_eq!(config.concurrency, 15);
        assert_eq!(config.timing.scroll_rounds, 2);
        assert_eq!(config.timing.feed_wait_ms, 4000);
        assert!(!config.filter.require_validated_email);
        assert_eq!(config.filter.personal_email_domains.len(), 6);
        assert_eq!(config.review_band, ReviewBand { min: 5, max: 200 });
        assert!(!config.email_search.enabled);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        std::fs::write(&path, r#"{"categories": ["Tree Service"], "concurrency": 4}"#).unwrap();

        let config = LeadConfig::from_json_file(&path).unwrap();
        assert_eq!(config.categories, vec!["Tree Service".to_string()]);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.locations.len(), DEFAULT_LOCATIONS.len());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            LeadConfig::from_json_file(&path),
            Err(ScraperError::Config(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = LeadConfig::default().with_concurrency(0);
        assert!(config.validate().is_err());
        assert!(LeadConfig::default().validate().is_ok());
    }
}

//! Field extraction from rendered listings

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ScraperError;
use crate::traits::{RenderClient, ResultEntry, Surface};

use super::types::{Email, Phone, Website};

pub const FEED_SELECTOR: &str = r#"div[role="feed"]"#;
pub const ENTRY_SELECTOR: &str = r#"div[role="article"]"#;
pub const WEBSITE_SELECTOR: &str = r#"a[data-value="Website"]"#;
pub const PHONE_SELECTOR: &str = r#"button[data-item-id^="phone"]"#;
pub const DETAILS_SELECTOR: &str = r#"div[role="main"]"#;
pub const CONSENT_SELECTOR: &str = r#"button[aria-label="Accept all"]"#;
/// Result snippet body on the web search page.
pub const SNIPPET_SELECTOR: &str = "div.VwiC3b";

const PHONE_LABEL_PREFIX: &str = "Phone:";
/// Shorter labels are rendering noise, not numbers.
const MIN_PHONE_LEN: usize = 5;

/// Reads name, website, phone and email off a listing and its details pane.
#[derive(Debug, Clone, Default)]
pub struct ResultExtractor {
    social_domains: Vec<String>,
}

impl ResultExtractor {
    pub fn new(social_domains: Vec<String>) -> Self {
        Self { social_domains }
    }

    /// Website control inside the listing. Lookup failures count as no website.
    pub async fn website<E: ResultEntry>(&self, entry: &E) -> Website {
        match entry.count(WEBSITE_SELECTOR).await {
            Ok(0) => Website::None,
            Ok(_) => {
                let href = entry
                    .attribute(WEBSITE_SELECTOR, "href")
                    .await
                    .unwrap_or_else(|e| {
                        debug!("website href lookup failed: {}", e);
                        None
                    });
                self.classify_website(href.as_deref())
            }
            Err(e) => {
                debug!("website lookup failed: {}", e);
                Website::None
            }
        }
    }

    /// A present control is a real website unless its link points at a social domain.
    pub fn classify_website(&self, href: Option<&str>) -> Website {
        match href {
            Some(href) => {
                let lower = href.to_lowercase();
                if self
                    .social_domains
                    .iter()
                    .any(|domain| lower.contains(&domain.to_lowercase()))
                {
                    Website::Social(href.to_string())
                } else {
                    Website::Own
                }
            }
            None => Website::Own,
        }
    }

    /// Phone from the details pane's phone button label.
    pub async fn phone<S: Surface>(&self, surface: &S) -> Phone {
        match surface.attribute(PHONE_SELECTOR, "aria-label").await {
            Ok(label) => phone_from_label(label.as_deref()),
            Err(e) => {
                debug!("phone lookup failed: {}", e);
                Phone::Unlisted
            }
        }
    }

    /// First email-looking token in the details pane.
    pub async fn email<S: Surface>(&self, surface: &S) -> Email {
        match surface.text(DETAILS_SELECTOR).await {
            Ok(text) => find_email(&text),
            Err(e) => {
                debug!("details pane read failed: {}", e);
                Email::NotFound
            }
        }
    }
}

/// Web search page for a business: "{name} {location} email contact".
pub fn email_search_url(base: &str, name: &str, location: &str) -> String {
    let query = format!("{} {} email contact", name, location);
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{}{}", base, encoded)
}

/// Look the business up on a separate surface and take the first address
/// found in the result snippets. The surface is closed on every path and
/// any failure yields `NotFound`.
pub async fn search_email<C: RenderClient>(client: &C, url: &str) -> Email {
    let surface = match client.new_surface().await {
        Ok(surface) => surface,
        Err(e) => {
            debug!("email search surface failed: {}", e);
            return Email::NotFound;
        }
    };

    let email = match snippet_email(&surface, url).await {
        Ok(email) => email,
        Err(e) => {
            debug!("email search failed for {}: {}", url, e);
            Email::NotFound
        }
    };

    if let Err(e) = surface.close().await {
        debug!("Failed to close email search surface: {}", e);
    }
    email
}

async fn snippet_email<S: Surface>(surface: &S, url: &str) -> Result<Email, ScraperError> {
    surface.goto(url).await?;
    for snippet in surface.entries(SNIPPET_SELECTOR).await? {
        match snippet.text().await {
            Ok(text) => {
                if let found @ Email::Found(_) = find_email_in_snippet(&text) {
                    return Ok(found);
                }
            }
            Err(e) => debug!("snippet read failed: {}", e),
        }
    }
    Ok(Email::NotFound)
}

/// First well-formed address in free text. Stricter than [`find_email`]:
/// search snippets are noisier than a details pane.
pub fn find_email_in_snippet(text: &str) -> Email {
    static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex")
    });

    text.split_whitespace()
        .filter(|word| word.contains('@'))
        .filter_map(|word| EMAIL_RE.find(word))
        .map(|m| m.as_str().to_lowercase())
        .find(|address| address.len() > 5)
        .map(Email::Found)
        .unwrap_or(Email::NotFound)
}

/// First non-empty line of the listing text, trimmed.
pub fn entry_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

pub fn phone_from_label(label: Option<&str>) -> Phone {
    let Some(label) = label else {
        return Phone::Unlisted;
    };
    let number = label
        .trim()
        .strip_prefix(PHONE_LABEL_PREFIX)
        .unwrap_or(label)
        .trim();

    if number.chars().count() < MIN_PHONE_LEN {
        Phone::Unlisted
    } else {
        Phone::Listed(number.to_string())
    }
}

pub fn find_email(text: &str) -> Email {
    text.split_whitespace()
        .find(|token| token.contains('@') && token.contains('.'))
        .map(|token| {
            let cleaned = token.trim_matches(|c: char| {
                matches!(c, '"' | '\'' | '(' | ')' | '<' | '>' | '[' | ']' | ',' | ';' | ':')
            });
            Email::Found(cleaned.trim().to_lowercase())
        })
        .unwrap_or(Email::NotFound)
}

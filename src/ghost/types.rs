//! Ghost lead pipeline types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Placeholders;

/// One (category, location) search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryUnit {
    pub category: String,
    pub location: String,
}

impl QueryUnit {
    pub fn new(category: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            location: location.into(),
        }
    }

    /// Free-text query sent to the directory, e.g. "Plumbing in Texas".
    pub fn search_term(&self) -> String {
        format!("{} in {}", self.category, self.location)
    }

    /// Full cross product, location-major.
    pub fn cross_product(categories: &[String], locations: &[String]) -> Vec<QueryUnit> {
        locations
            .iter()
            .flat_map(|location| {
                categories
                    .iter()
                    .map(move |category| QueryUnit::new(category.clone(), location.clone()))
            })
            .collect()
    }
}

impl fmt::Display for QueryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.search_term())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phone {
    Listed(String),
    Unlisted,
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phone::Listed(number) => f.write_str(number),
            Phone::Unlisted => f.write_str("unlisted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Email {
    Found(String),
    NotFound,
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Email::Found(address) => f.write_str(address),
            Email::NotFound => f.write_str("not-found"),
        }
    }
}

/// What the listing's website control points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Website {
    None,
    /// A social profile or free page builder; still a ghost.
    Social(String),
    Own,
}

impl Website {
    pub fn is_present(&self) -> bool {
        matches!(self, Website::Own)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub name: String,
    pub website: Website,
    pub phone: Phone,
    pub email: Email,
    /// Email is on a personal provider domain (gmail, yahoo, ...).
    pub email_validated: bool,
    pub source: QueryUnit,
}

impl CandidateRecord {
    pub fn has_website(&self) -> bool {
        self.website.is_present()
    }
}

/// Output column order.
pub const LEAD_COLUMNS: [&str; 9] = [
    "Name",
    "Address",
    "Website",
    "Phone",
    "Reviews",
    "Rating",
    "Email",
    "Instagram",
    "SearchTerm",
];

/// An accepted candidate, ready to be written. Its name is the dedup identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedLead {
    pub name: String,
    pub address: String,
    pub website: String,
    pub phone: String,
    pub reviews: String,
    pub rating: String,
    pub email: String,
    pub instagram: String,
    pub search_term: String,
}

impl AcceptedLead {
    pub fn assemble(candidate: &CandidateRecord, placeholders: &Placeholders) -> Self {
        let website = match &candidate.website {
            Website::Social(url) => url.clone(),
            _ => placeholders.no_website.clone(),
        };

        Self {
            name: candidate.name.clone(),
            address: placeholders
                .address
                .clone()
                .unwrap_or_else(|| candidate.source.location.clone()),
            website,
            phone: candidate.phone.to_string(),
            reviews: placeholders.reviews.clone(),
            rating: placeholders.rating.clone(),
            email: candidate.email.to_string(),
            instagram: placeholders.instagram.clone(),
            search_term: candidate.source.search_term(),
        }
    }

    pub fn fields(&self) -> [&str; 9] {
        [
            &self.name,
            &self.address,
            &self.website,
            &self.phone,
            &self.reviews,
            &self.rating,
            &self.email,
            &self.instagram,
            &self.search_term,
        ]
    }
}
